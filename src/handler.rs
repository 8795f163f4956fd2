use crate::{
    builder::{BuildError, Builder},
    payload::PushEvent,
    repository::{Repository, RepositoryError},
};
use log::{debug, info};
use thiserror::Error;

/// What happened with a push notification.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The pushed reference is not the watched branch, nothing ran.
    Ignored,
    /// Fetch, checkout and build all completed.
    Built,
}

/// A custom error describing the error cases for handling a push.
///
/// Each failing step aborts the sequence. Fetch and checkout failures are
/// reported the same way as build failures instead of crashing the request.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The fetch or the checkout failed, the checkout is out of sync.
    #[error("{0}")]
    FailedSync(#[from] RepositoryError),
    /// The benchmark build failed, the checkout points to the new commit.
    #[error("{0}")]
    FailedBuild(#[from] BuildError),
}

/// The webhook handler: filters pushes to the watched branch and runs the
/// fetch, checkout and build sequence on the shared checkout.
pub struct Handler<R: Repository, B: Builder> {
    repository: R,
    builder: B,
    branch: String,
}

impl<R: Repository, B: Builder> Handler<R, B> {
    /// Creates a new handler watching the given reference (e.g. "refs/heads/main").
    pub fn new(repository: R, builder: B, branch: String) -> Self {
        Handler {
            repository,
            builder,
            branch,
        }
    }

    /// Handle one push notification to completion.
    ///
    /// Pushes to any other reference are ignored. For the watched branch the
    /// steps run in order, each one blocking until its subprocess finishes.
    pub fn handle(&mut self, event: &PushEvent) -> Result<Outcome, HandlerError> {
        if event.reference != self.branch {
            debug!("Ignoring push to {}.", event.reference);
            return Ok(Outcome::Ignored);
        }

        info!("Fetching new changes.");
        self.repository.fetch()?;

        info!("Checking out new changes {}.", event.after);
        self.repository.checkout(&event.after)?;

        info!("Building benchmark for {}.", event.after);
        self.builder.build(&event.after)?;

        Ok(Outcome::Built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::MockBuilder, repository::MockRepository};
    use log::Level;
    use mockall::Sequence;

    fn push_to(reference: &str, after: &str) -> PushEvent {
        PushEvent {
            reference: String::from(reference),
            after: String::from(after),
        }
    }

    #[test]
    fn it_should_ignore_pushes_to_other_branches() {
        let mut repository = MockRepository::new();
        repository.expect_fetch().times(0);
        repository.expect_checkout().times(0);
        let mut builder = MockBuilder::new();
        builder.expect_build().times(0);

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let outcome = handler.handle(&push_to("refs/heads/develop", "abc123")).unwrap();

        assert_eq!(Outcome::Ignored, outcome);
    }

    #[test]
    fn it_should_fetch_checkout_and_build_in_order() {
        let mut seq = Sequence::new();

        let mut repository = MockRepository::new();
        repository
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        repository
            .expect_checkout()
            .withf(|commit| commit == "deadbeef")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut builder = MockBuilder::new();
        builder
            .expect_build()
            .withf(|commit| commit == "deadbeef")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::from("gossip ran")));

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let outcome = handler.handle(&push_to("refs/heads/main", "deadbeef")).unwrap();

        assert_eq!(Outcome::Built, outcome);
    }

    #[test]
    fn it_should_stop_if_the_fetch_fails() {
        let mut repository = MockRepository::new();
        repository.expect_fetch().times(1).returning(|| {
            Err(RepositoryError::FetchFailed(
                String::from("origin"),
                String::from("could not resolve host"),
            ))
        });
        repository.expect_checkout().times(0);
        let mut builder = MockBuilder::new();
        builder.expect_build().times(0);

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let error = handler
            .handle(&push_to("refs/heads/main", "deadbeef"))
            .err()
            .unwrap();

        assert!(
            matches!(error, HandlerError::FailedSync(_)),
            "{error:?} should be FailedSync"
        );
    }

    #[test]
    fn it_should_stop_if_the_checkout_fails() {
        let mut repository = MockRepository::new();
        repository.expect_fetch().times(1).returning(|| Ok(()));
        repository.expect_checkout().times(1).returning(|commit| {
            Err(RepositoryError::MissingCommit(String::from(commit)))
        });
        let mut builder = MockBuilder::new();
        builder.expect_build().times(0);

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let error = handler
            .handle(&push_to("refs/heads/main", "deadbeef"))
            .err()
            .unwrap();

        assert!(
            matches!(error, HandlerError::FailedSync(RepositoryError::MissingCommit(_))),
            "{error:?} should be FailedSync"
        );
    }

    #[test]
    fn it_should_report_a_failed_build() {
        let mut repository = MockRepository::new();
        repository.expect_fetch().times(1).returning(|| Ok(()));
        repository.expect_checkout().times(1).returning(|_| Ok(()));
        let mut builder = MockBuilder::new();
        builder
            .expect_build()
            .times(1)
            .returning(|_| Err(BuildError::NonZeroExitCode(1, String::from("boom"))));

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let error = handler
            .handle(&push_to("refs/heads/main", "deadbeef"))
            .err()
            .unwrap();

        assert!(
            matches!(error, HandlerError::FailedBuild(BuildError::NonZeroExitCode(1, _))),
            "{error:?} should be FailedBuild"
        );
        assert!(
            error.to_string().contains("boom"),
            "{error} should carry the build output"
        );
    }

    #[test]
    fn it_should_respond_the_same_way_twice() {
        let mut repository = MockRepository::new();
        repository.expect_fetch().times(2).returning(|| Ok(()));
        repository.expect_checkout().times(2).returning(|_| Ok(()));
        let mut builder = MockBuilder::new();
        builder
            .expect_build()
            .times(2)
            .returning(|_| Ok(String::new()));

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        let event = push_to("refs/heads/main", "deadbeef");

        assert_eq!(Outcome::Built, handler.handle(&event).unwrap());
        assert_eq!(Outcome::Built, handler.handle(&event).unwrap());
    }

    #[test]
    fn it_should_log_the_sync_steps() {
        testing_logger::setup();

        let mut repository = MockRepository::new();
        repository.expect_fetch().returning(|| Ok(()));
        repository.expect_checkout().returning(|_| Ok(()));
        let mut builder = MockBuilder::new();
        builder.expect_build().returning(|_| Ok(String::new()));

        let mut handler = Handler::new(repository, builder, String::from("refs/heads/main"));
        handler.handle(&push_to("refs/heads/main", "deadbeef")).unwrap();

        testing_logger::validate(|captured_logs| {
            let infos: Vec<&str> = captured_logs
                .iter()
                .filter(|log| log.level == Level::Info)
                .map(|log| log.body.as_str())
                .collect();
            assert!(infos.contains(&"Fetching new changes."));
            assert!(infos.contains(&"Checking out new changes deadbeef."));
            assert!(infos.contains(&"Building benchmark for deadbeef."));
        });
    }
}
