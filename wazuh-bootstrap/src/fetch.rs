// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Acquisition, validation, and execution of the vendor install script.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use slog::{info, Logger};

use debian_utils::{BoxedExecutor, CHMOD};

use crate::config::BootstrapPlan;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("failed to read installer at {path}: {err}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("installer at {path} is empty")]
    Empty { path: Utf8PathBuf },

    #[error(
        "installer at {path} does not begin with an interpreter line \
         (first line: {first_line:?}); refusing to execute it"
    )]
    NotAScript { path: Utf8PathBuf, first_line: String },
}

/// An installer artifact that passed shape validation.
///
/// [`run_installer`] only accepts this type, so an unvalidated artifact
/// cannot be executed.
#[derive(Debug)]
pub struct ValidatedInstaller(Utf8PathBuf);

impl ValidatedInstaller {
    pub fn path(&self) -> &Utf8Path {
        &self.0
    }
}

/// Downloads the vendor install script into the working directory,
/// unconditionally replacing any previous copy. The vendor script is
/// the single source of truth for install-time decisions, so
/// acquisition is deliberately not guarded the way key and repository
/// registration are.
pub async fn fetch_installer(
    plan: &BootstrapPlan,
    client: &reqwest::Client,
    log: &Logger,
) -> anyhow::Result<Utf8PathBuf> {
    let path = plan.installer_path();
    if path.exists() {
        info!(log, "removing previous installer copy"; "path" => %&path);
        std::fs::remove_file(&path).with_context(|| {
            format!("failed to remove previous installer copy at {path}")
        })?;
    }

    let url = plan.installer_url();
    info!(log, "downloading vendor installer"; "url" => &url);
    let body = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("failed to download installer from {url}"))?
        .error_for_status()
        .with_context(|| format!("installer endpoint {url} returned an error"))?
        .bytes()
        .await
        .with_context(|| format!("failed to read installer body from {url}"))?;

    std::fs::write(&path, &body)
        .with_context(|| format!("failed to write installer to {path}"))?;
    info!(
        log, "downloaded vendor installer";
        "path" => %&path,
        "bytes" => body.len(),
    );
    Ok(path)
}

/// Checks that the downloaded artifact looks like an executable script:
/// its first line must begin with the `#!` interpreter marker. This is
/// the only defense against an HTML error page or truncated download
/// masquerading as the installer; it is not a cryptographic check.
pub fn validate_installer(
    path: &Utf8Path,
    log: &Logger,
) -> Result<ValidatedInstaller, ValidationError> {
    let bytes = std::fs::read(path).map_err(|err| ValidationError::Io {
        path: path.to_owned(),
        err,
    })?;
    if bytes.is_empty() {
        return Err(ValidationError::Empty { path: path.to_owned() });
    }

    for (number, line) in bytes.split(|b| *b == b'\n').take(3).enumerate() {
        info!(
            log, "installer head";
            "line" => number + 1,
            "text" => %String::from_utf8_lossy(line),
        );
    }

    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    if !first_line.starts_with(b"#!") {
        return Err(ValidationError::NotAScript {
            path: path.to_owned(),
            first_line: String::from_utf8_lossy(first_line).to_string(),
        });
    }

    Ok(ValidatedInstaller(path.to_owned()))
}

/// Marks the validated installer executable and runs it in unattended
/// all-in-one mode. The script is an opaque external program: only its
/// aggregate exit status is interpreted, and a failure aborts the whole
/// sequence with that status.
pub fn run_installer(
    installer: &ValidatedInstaller,
    executor: &BoxedExecutor,
    log: &Logger,
) -> anyhow::Result<()> {
    let path = installer.path();

    let mut cmd = std::process::Command::new(CHMOD);
    let cmd = cmd.args(["+x", path.as_str()]);
    executor
        .execute(cmd)
        .with_context(|| format!("failed to mark {path} executable"))?;

    info!(log, "running vendor installer unattended"; "path" => %path);
    let mut cmd = std::process::Command::new(path.as_str());
    let cmd = cmd.arg("-a");
    executor.execute(cmd).context("vendor installer failed")?;

    info!(log, "vendor installer finished"; "path" => %path);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::BootstrapPlan;
    use camino_tempfile::Utf8TempDir;
    use debian_utils::{FakeExecutor, StaticHandler};
    use slog::o;

    fn log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[test]
    fn test_validation_accepts_shebang_script() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("wazuh-install.sh");
        std::fs::write(&path, "#!/bin/bash\nset -e\necho installing\n")
            .unwrap();

        let installer =
            validate_installer(&path, &log()).expect("script is valid");
        assert_eq!(installer.path(), &path);
    }

    #[test]
    fn test_validation_rejects_html_error_page() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("wazuh-install.sh");
        std::fs::write(
            &path,
            "<!DOCTYPE html>\n<html><body>404 Not Found</body></html>\n",
        )
        .unwrap();

        let err = validate_installer(&path, &log())
            .expect_err("html page is rejected");
        match err {
            ValidationError::NotAScript { first_line, .. } => {
                assert_eq!(first_line, "<!DOCTYPE html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_rejects_empty_artifact() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("wazuh-install.sh");
        std::fs::write(&path, "").unwrap();

        let err =
            validate_installer(&path, &log()).expect_err("empty is rejected");
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn test_run_installer_marks_executable_then_runs_unattended() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());
        let path = plan.installer_path();
        std::fs::write(&path, "#!/bin/bash\n").unwrap();
        let installer =
            validate_installer(&path, &log()).expect("script is valid");

        let executor = FakeExecutor::new(log());
        let mut handler = StaticHandler::new();
        handler.expect_ok(format!("/usr/bin/chmod +x {path}"));
        handler.expect_ok(format!("{path} -a"));
        handler.register(&executor);

        run_installer(&installer, &executor.as_executor(), &log())
            .expect("installer succeeds");
    }

    #[test]
    fn test_run_installer_propagates_installer_failure() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());
        let path = plan.installer_path();
        std::fs::write(&path, "#!/bin/bash\n").unwrap();
        let installer =
            validate_installer(&path, &log()).expect("script is valid");

        let executor = FakeExecutor::new(log());
        let mut handler = StaticHandler::new();
        handler.expect_ok(format!("/usr/bin/chmod +x {path}"));
        handler.expect_fail(format!("{path} -a"));
        handler.register(&executor);

        let err = run_installer(&installer, &executor.as_executor(), &log())
            .expect_err("installer failure propagates");
        assert!(err.to_string().contains("vendor installer failed"));
    }
}
