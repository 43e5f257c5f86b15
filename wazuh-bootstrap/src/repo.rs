// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration of the vendor trust key and apt repository definition.
//!
//! Both actions are guarded so a re-run of the sequence is a no-op once
//! the host is registered.

use anyhow::Context;
use slog::{info, Logger};

use debian_utils::{BoxedExecutor, GPG};

use crate::config::BootstrapPlan;

/// Registers the vendor trust key with the system trust store.
///
/// Skips entirely when the keyring file already exists; otherwise
/// fetches the ASCII-armored key and converts it to the binary keyring
/// format apt consumes.
pub async fn register_trust_key(
    plan: &BootstrapPlan,
    executor: &BoxedExecutor,
    client: &reqwest::Client,
    log: &Logger,
) -> anyhow::Result<()> {
    if plan.keyring_path.exists() {
        info!(
            log, "trust key already registered; skipping";
            "keyring" => %&plan.keyring_path,
        );
        return Ok(());
    }

    let url = plan.key_url();
    info!(log, "fetching vendor trust key"; "url" => &url);
    let armored = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("failed to fetch trust key from {url}"))?
        .error_for_status()
        .with_context(|| format!("trust key endpoint {url} returned an error"))?
        .text()
        .await
        .with_context(|| format!("failed to read trust key body from {url}"))?;

    // gpg reads the armored material from a scratch file next to the
    // installer download.
    let armored_path = plan.work_dir.join("GPG-KEY-WAZUH.asc");
    std::fs::write(&armored_path, &armored).with_context(|| {
        format!("failed to write armored trust key to {armored_path}")
    })?;

    let mut cmd = std::process::Command::new(GPG);
    let cmd = cmd.args([
        "--output",
        plan.keyring_path.as_str(),
        "--dearmor",
        armored_path.as_str(),
    ]);
    executor
        .execute(cmd)
        .context("failed to convert the trust key to binary keyring form")?;

    let _ = std::fs::remove_file(&armored_path);

    info!(
        log, "trust key registered";
        "keyring" => %&plan.keyring_path,
    );
    Ok(())
}

/// Registers the vendor apt repository, self-healing the definition
/// file: the desired single-line definition is always computed, and the
/// file is rewritten whenever its contents differ, covering both a
/// missing file and a stale or corrupted one.
///
/// Returns whether the file was (re)written. The caller is responsible
/// for refreshing the package index afterwards.
pub fn register_repository(
    plan: &BootstrapPlan,
    log: &Logger,
) -> anyhow::Result<bool> {
    let desired = plan.repo_definition();

    if plan.sources_path.exists() {
        let current =
            std::fs::read_to_string(&plan.sources_path).with_context(|| {
                format!(
                    "failed to read repository definition at {}",
                    plan.sources_path,
                )
            })?;
        if current == desired {
            info!(
                log, "repository already registered; skipping";
                "sources" => %&plan.sources_path,
            );
            return Ok(false);
        }
        info!(
            log, "repository definition is stale; rewriting";
            "sources" => %&plan.sources_path,
            "current" => current.trim(),
            "desired" => desired.trim(),
        );
    }

    std::fs::write(&plan.sources_path, &desired).with_context(|| {
        format!("failed to write repository definition at {}", plan.sources_path)
    })?;
    info!(
        log, "repository registered";
        "sources" => %&plan.sources_path,
        "definition" => desired.trim(),
    );
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use debian_utils::{FakeExecutor, StaticHandler};
    use slog::o;

    fn log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[tokio::test]
    async fn test_key_registration_skips_existing_keyring() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());
        std::fs::write(&plan.keyring_path, b"binary keyring").unwrap();

        // No commands and no requests are expected; an unexpected
        // command would panic the fake executor.
        let executor = FakeExecutor::new(log());
        StaticHandler::new().register(&executor);

        register_trust_key(
            &plan,
            &executor.as_executor(),
            &reqwest::Client::new(),
            &log(),
        )
        .await
        .expect("skip succeeds");

        assert_eq!(
            std::fs::read(&plan.keyring_path).unwrap(),
            b"binary keyring"
        );
    }

    #[test]
    fn test_repo_registration_skips_matching_definition() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());
        std::fs::write(&plan.sources_path, plan.repo_definition()).unwrap();

        // Make any write attempt fail loudly.
        let mut perms =
            std::fs::metadata(&plan.sources_path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&plan.sources_path, perms).unwrap();

        let written =
            register_repository(&plan, &log()).expect("skip succeeds");
        assert!(!written);
    }

    #[test]
    fn test_repo_registration_heals_stale_definition() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());
        std::fs::write(
            &plan.sources_path,
            "deb https://example.com/apt stale main\n",
        )
        .unwrap();

        let written =
            register_repository(&plan, &log()).expect("rewrite succeeds");
        assert!(written);
        assert_eq!(
            std::fs::read_to_string(&plan.sources_path).unwrap(),
            plan.repo_definition()
        );
    }

    #[test]
    fn test_repo_registration_writes_missing_definition() {
        let dir = Utf8TempDir::new().unwrap();
        let plan = BootstrapPlan::rooted_at(dir.path());

        let written =
            register_repository(&plan, &log()).expect("write succeeds");
        assert!(written);
        assert_eq!(
            std::fs::read_to_string(&plan.sources_path).unwrap(),
            plan.repo_definition()
        );
    }
}
