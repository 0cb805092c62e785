//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Variables the CLI reads that must not leak in from the outer environment.
const SCRUBBED: &[&str] = &[
    "ENVSECRETS_ENV",
    "ENVSECRETS_LOCAL_ENV",
    "ENVSECRETS_SECRET_ID",
    "ENVSECRETS_REFRESH_SECS",
    "ENVSECRETS_MAX_CACHE_SIZE",
    "ENVSECRETS_VERSION_STAGE",
    "ENVSECRETS_LOG",
];

impl Test {
    /// Create an envsecrets command running in the test directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("envsecrets").expect("failed to find envsecrets binary");
        for var in SCRUBBED {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `envsecrets --env <env> get <key>` with extra env vars.
    pub fn get(&self, env: &str, key: &str, vars: &[(&str, &str)]) -> Output {
        let mut cmd = self.cmd();
        cmd.args(["--env", env, "get", key]);
        for (k, v) in vars {
            cmd.env(k, v);
        }
        cmd.output().expect("failed to run envsecrets get")
    }

    /// Shortcut for `envsecrets status`.
    pub fn status(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .arg("status")
            .output()
            .expect("failed to run envsecrets status")
    }
}
