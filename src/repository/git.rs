use super::{Repository, RepositoryError};
use git2::{
    build::CheckoutBuilder, AutotagOption, Cred, CredentialType, FetchOptions, ObjectType,
    RemoteCallbacks, Repository as UnderlyingRepository,
};
use log::debug;

/// The local git clone, wrapped around libgit2.
///
/// Fetching uses the remotes configured on the clone, with the same refspecs
/// a plain `git fetch` would use. Checking out moves the working tree to the
/// pushed commit with a forced checkout: local modifications are discarded,
/// the benchmark checkout is not a working copy.
pub struct GitRepository {
    repo: UnderlyingRepository,
    directory: String,
}

impl GitRepository {
    /// Open the git repository at the given directory.
    pub fn open(directory: &str) -> Result<Self, RepositoryError> {
        let repo = UnderlyingRepository::open(directory).map_err(|err| {
            RepositoryError::NotAGitRepository(String::from(directory), err.message().to_string())
        })?;

        Ok(GitRepository {
            repo,
            directory: String::from(directory),
        })
    }

    /// The directory the repository was opened from.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    fn fetch_options() -> FetchOptions<'static> {
        let mut cb = RemoteCallbacks::new();
        cb.credentials(|_url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                Cred::ssh_key_from_agent(username.unwrap_or("git"))
            } else {
                Cred::default()
            }
        });

        let mut opts = FetchOptions::new();
        opts.remote_callbacks(cb);
        opts.download_tags(AutotagOption::All);
        opts
    }
}

impl Repository for GitRepository {
    /// Fetch every configured remote, the equivalent of `git fetch --all`.
    /// An empty refspec list makes libgit2 use the refspecs configured on
    /// the remote. A repository without remotes fetches nothing and succeeds.
    fn fetch(&mut self) -> Result<(), RepositoryError> {
        let remote_names: Vec<String> = self
            .repo
            .remotes()
            .map_err(|err| {
                RepositoryError::FetchFailed(self.directory.clone(), err.message().to_string())
            })?
            .iter()
            .flatten()
            .map(String::from)
            .collect();

        let mut opts = Self::fetch_options();
        for name in remote_names {
            debug!("Fetching remote {name}.");
            let mut remote = self.repo.find_remote(&name).map_err(|err| {
                RepositoryError::FetchFailed(name.clone(), err.message().to_string())
            })?;
            remote
                .fetch(&[] as &[&str], Some(&mut opts), None)
                .map_err(|err| {
                    RepositoryError::FetchFailed(name.clone(), err.message().to_string())
                })?;
        }

        Ok(())
    }

    /// Move the working tree to the commit, the equivalent of
    /// `git checkout --force <commit>`. Abbreviated ids are resolved too.
    /// HEAD ends up detached on the commit.
    fn checkout(&mut self, commit: &str) -> Result<(), RepositoryError> {
        let object = self
            .repo
            .revparse_single(commit)
            .and_then(|object| object.peel(ObjectType::Commit))
            .map_err(|_| RepositoryError::MissingCommit(String::from(commit)))?;

        debug!("Checking out {} in {}.", object.id(), self.directory);
        self.repo
            .checkout_tree(&object, Some(CheckoutBuilder::default().force()))
            .map_err(|err| {
                RepositoryError::CheckoutFailed(String::from(commit), err.message().to_string())
            })?;
        self.repo.set_head_detached(object.id()).map_err(|err| {
            RepositoryError::CheckoutFailed(String::from(commit), err.message().to_string())
        })?;

        Ok(())
    }
}
