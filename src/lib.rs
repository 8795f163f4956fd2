//! Listen for push webhooks, sync a git checkout and run the benchmark build.
//!
//! ## How it works
//!
//! `benchhook` is a small webhook receiver for a benchmark box. The git host
//! calls it on every push; pushes to the watched branch fetch the remotes,
//! force the checkout onto the pushed commit and run the zig benchmark build
//! with the commit id as the telemetry tag. The caller gets the result in the
//! response: 200 when everything ran (or the push was for another branch),
//! 500 with the error when any step failed.
//!
//! ```ignore
//! +---------+       +-----------------+       +-----------+
//! | webhook | ----> | fetch, checkout | ----> | zig build |
//! +---------+       +-----------------+       +-----------+
//! ```
//!
//! The three steps run to completion inside the request, one push at a time;
//! overlapping webhooks wait instead of racing on the shared checkout.

use thiserror::Error;

/// Command line parsing.
pub mod args;
/// The benchmark build that runs after a sync (e.g. [zig build](builder::zig::ZigBuilder)).
pub mod builder;
/// The push handler connecting payload, repository and builder.
pub mod handler;
/// Terminal logger setup.
pub mod logger;
/// The push notification payload.
pub mod payload;
/// The local git checkout the benchmark is built from.
pub mod repository;
/// The HTTP server receiving the webhooks.
pub mod server;

/// All the errors that can happen during startup.
#[derive(Debug, Error)]
pub enum MainError {
    /// There was no directory argument.
    #[error("You have to pass the directory of the local checkout.")]
    MissingDirectory,
    /// The directory cannot be opened as a git repository.
    #[error("Cannot open repository: {0}.")]
    FailedRepository(#[from] repository::RepositoryError),
    /// The server cannot bind its listening socket.
    #[error("Cannot start server: {0}.")]
    FailedServer(#[from] server::ServerError),
    /// The logger cannot be initialized twice.
    #[error("Failed setting up the logger: {0}.")]
    FailedLogger(#[from] log::SetLoggerError),
    /// The local timezone cannot be determined for log timestamps.
    #[error("Failed detecting the local timezone.")]
    FailedLoggerTimezones,
}
