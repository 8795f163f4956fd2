use super::{BuildError, Builder};
use duct::cmd;
use log::{debug, error};

/// The fixed part of the invocation: release-safe build of the benchmark
/// target, running the gossip benchmark.
const BUILD_ARGS: [&str; 5] = ["build", "-Doptimize=ReleaseSafe", "benchmark", "--", "gossip"];

/// A builder that runs `zig build` in the checkout directory.
///
/// The command is executed directly as an argument vector, never through a
/// shell, so the commit id cannot smuggle extra commands in. Both stdout and
/// stderr are captured; a failing build carries its output in the error.
pub struct ZigBuilder {
    directory: String,
    zig: String,
}

impl ZigBuilder {
    /// Creates a new builder running the given zig binary in the directory.
    pub fn new(directory: String, zig: String) -> Self {
        ZigBuilder { directory, zig }
    }

    fn build_inner(&self, commit: &str) -> Result<String, BuildError> {
        let telemetry = format!("--telemetry={commit}");
        let args = BUILD_ARGS.iter().copied().chain([telemetry.as_str()]);

        let output = cmd(self.zig.as_str(), args)
            .stderr_to_stdout()
            .stdout_capture()
            .dir(&self.directory)
            .unchecked()
            .run()?;

        let output_str =
            std::str::from_utf8(&output.stdout).map_err(|_| BuildError::NonUtf8Output)?;
        let output_str = output_str.trim_end().to_string();

        if output.status.success() {
            Ok(output_str)
        } else {
            Err(BuildError::NonZeroExitCode(
                output.status.code().unwrap_or(-1),
                output_str,
            ))
        }
    }
}

impl Builder for ZigBuilder {
    /// Run the benchmark build for the commit. If the build fails to start
    /// or returns a non-zero exit code, this function results in an error.
    fn build(&self, commit: &str) -> Result<String, BuildError> {
        debug!(
            "Running {} build for commit {commit} in directory {}.",
            self.zig, self.directory
        );

        match self.build_inner(commit) {
            Ok(result) => {
                debug!("Build success, output:");
                result.lines().for_each(|line| {
                    debug!("{line}");
                });
                Ok(result)
            }
            Err(err) => {
                error!("Failed: {err}.");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_create_a_new_builder() {
        let builder = ZigBuilder::new(String::from("."), String::from("zig"));

        assert_eq!(".", builder.directory);
        assert_eq!("zig", builder.zig);
    }

    #[test]
    fn it_should_pass_the_commit_as_one_argument() -> Result<(), BuildError> {
        // Substituting echo for zig prints the exact argument vector
        let builder = ZigBuilder::new(String::from("."), String::from("echo"));

        let output = builder.build("deadbeef")?;
        assert_eq!(
            "build -Doptimize=ReleaseSafe benchmark -- gossip --telemetry=deadbeef",
            output
        );

        Ok(())
    }

    #[test]
    fn it_should_fail_if_the_build_fails() {
        let builder = ZigBuilder::new(String::from("."), String::from("false"));

        let result = builder.build("deadbeef");
        assert!(
            matches!(result, Err(BuildError::NonZeroExitCode(1, _))),
            "{result:?} should match non zero exit code"
        );
    }

    #[test]
    fn it_should_fail_if_the_binary_is_missing() {
        let builder = ZigBuilder::new(String::from("."), String::from("/path/to/nowhere/zig"));

        let result = builder.build("deadbeef");
        assert!(
            matches!(result, Err(BuildError::BuildFailure(_))),
            "{result:?} should match a failure to run"
        );
    }

    #[test]
    #[cfg(unix)]
    fn it_should_report_the_output_of_a_failing_build() -> Result<(), std::io::Error> {
        use rand::distributions::{Alphanumeric, DistString};
        use std::{fs, os::unix::fs::PermissionsExt};

        let id = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let script = format!("test_directories/{id}-zig");
        fs::create_dir_all("test_directories")?;
        fs::write(&script, "#!/bin/sh\necho boom >&2\nexit 3\n")?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;

        let builder = ZigBuilder::new(String::from("."), script.clone());
        let result = builder.build("deadbeef");

        // Stderr is folded into the captured output and lands in the error
        match result {
            Err(BuildError::NonZeroExitCode(code, output)) => {
                assert_eq!(3, code);
                assert_eq!("boom", output);
            }
            other => panic!("{other:?} should match non zero exit code"),
        }

        fs::remove_file(&script)?;

        Ok(())
    }
}
