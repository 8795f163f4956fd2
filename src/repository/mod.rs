use mockall::automock;
use thiserror::Error;

/// The git implementation of the local checkout.
pub mod git;

/// A custom error describing the error cases for repository synchronization.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The directory is not a valid git repository.
    #[error("{0} is not a valid git repository ({1})")]
    NotAGitRepository(String, String),
    /// Cannot fetch from a remote. This can be a network failure,
    /// an authentication error or many other things.
    #[error("cannot fetch from {0} ({1})")]
    FetchFailed(String, String),
    /// The pushed commit is not in the repository, even after fetching.
    /// Usually this means the webhook came from an unrelated repository.
    #[error("commit {0} not found in the repository")]
    MissingCommit(String),
    /// Cannot move the working tree to the commit.
    #[error("could not check out commit {0} ({1})")]
    CheckoutFailed(String, String),
}

/// The local checkout that the benchmark is built from.
///
/// Every webhook shares one checkout on disk, so there is exactly one
/// implementor per watched directory and callers are expected to serialize
/// access to it.
#[automock]
pub trait Repository {
    /// Download new objects and refs from every configured remote.
    fn fetch(&mut self) -> Result<(), RepositoryError>;

    /// Move the working tree to the given commit, detaching HEAD.
    fn checkout(&mut self, commit: &str) -> Result<(), RepositoryError>;
}
