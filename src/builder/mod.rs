use mockall::automock;
use thiserror::Error;

/// The zig build invocation of the benchmark.
pub mod zig;

/// A custom error describing the error cases for the benchmark build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The underlying Rust command creation failed. The parameter contains the error.
    #[error("the build cannot run: {0}")]
    BuildFailure(#[from] std::io::Error),
    /// The build returned a non-zero exit code, usually meaning a compile error
    /// or a failing benchmark. The parameters are the exit code and the output.
    #[error("the build returned non-zero exit code {0} with message: {1}")]
    NonZeroExitCode(i32, String),
    /// The build output contains non-UTF8 characters.
    #[error("the build returned invalid characters")]
    NonUtf8Output,
}

/// A builder compiles and runs the benchmark for a commit.
///
/// The commit id is forwarded to the benchmark as its telemetry tag, so the
/// reported measurements can be tied back to the push that produced them.
#[automock]
pub trait Builder {
    /// Run the build, returning the combined output on success.
    fn build(&self, commit: &str) -> Result<String, BuildError>;
}
