// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use slog::Drain;

use bootstrap_common::cmd::CmdError;
use bootstrap_common::FileKv;
use debian_utils::HostExecutor;

use crate::config::{BootstrapPlan, DEFAULT_RELEASE};
use crate::sequence;

/// Wazuh bootstrap app.
///
/// Invoking it with no flags performs a full default install; the flags
/// only override where artifacts land and which release is fetched.
#[derive(Debug, Parser)]
#[command(version, about = "Unattended Wazuh all-in-one installer")]
pub struct BootstrapApp {
    /// Vendor release to install.
    #[clap(long, default_value = DEFAULT_RELEASE)]
    release: String,

    /// Directory the installer script is downloaded into.
    #[clap(long, default_value = ".")]
    work_dir: Utf8PathBuf,

    /// File the run log is duplicated into.
    #[clap(long, default_value = "/var/log/wazuh-bootstrap.log")]
    log_path: Utf8PathBuf,
}

impl BootstrapApp {
    pub fn log_path(&self) -> &Utf8Path {
        &self.log_path
    }

    /// Executes the app.
    pub async fn exec(self, log: &slog::Logger) -> Result<(), CmdError> {
        let plan = BootstrapPlan {
            release: self.release,
            work_dir: self.work_dir,
            ..Default::default()
        };
        let executor = HostExecutor::new(log.clone()).as_executor();
        sequence::run(&plan, &executor, log).await
    }

    pub fn setup_log(
        path: impl AsRef<Utf8Path>,
    ) -> anyhow::Result<slog::Logger> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref().as_std_path())?;

        let file_decorator = slog_term::PlainDecorator::new(file);
        let file_drain =
            slog_term::FullFormat::new(file_decorator).build().fuse();

        let stderr_drain = stderr_env_drain("RUST_LOG");

        let drain = slog::Duplicate::new(file_drain, stderr_drain).fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Ok(slog::Logger::root(drain, slog::o!(FileKv)))
    }
}

fn stderr_env_drain(env_var: &str) -> impl Drain<Ok = (), Err = slog::Never> {
    let stderr_decorator = slog_term::TermDecorator::new().build();
    let stderr_drain =
        slog_term::FullFormat::new(stderr_decorator).build().fuse();
    let mut builder = slog_envlogger::LogBuilder::new(stderr_drain);
    if let Ok(s) = std::env::var(env_var) {
        builder = builder.parse(&s);
    } else {
        // Log at the info level by default.
        builder = builder.filter(None, slog::FilterLevel::Info);
    }
    builder.build()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_flag_invocation_uses_production_defaults() {
        let app = BootstrapApp::parse_from(["wazuh-bootstrap"]);
        assert_eq!(app.release, DEFAULT_RELEASE);
        assert_eq!(app.work_dir, Utf8PathBuf::from("."));
        assert_eq!(
            app.log_path(),
            Utf8Path::new("/var/log/wazuh-bootstrap.log")
        );
    }

    #[test]
    fn test_release_override() {
        let app = BootstrapApp::parse_from([
            "wazuh-bootstrap",
            "--release",
            "4.8",
            "--work-dir",
            "/tmp",
        ]);
        assert_eq!(app.release, "4.8");
        assert_eq!(app.work_dir, Utf8PathBuf::from("/tmp"));
    }
}
