// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The provisioning sequence: a strict top-to-bottom pipeline with no
//! retries and no branching between stages.

use slog::{info, Logger};

use bootstrap_common::cmd::CmdError;
use debian_utils::apt::Apt;
use debian_utils::{BoxedExecutor, ExecutionError};

use crate::config::BootstrapPlan;
use crate::{fetch, preflight, repo, services};

/// Runs the whole sequence against the host described by `plan`.
///
/// The only two explicit fatal failure points are the privilege check
/// and installer shape validation; every other failure propagates the
/// underlying command's own exit status.
pub async fn run(
    plan: &BootstrapPlan,
    executor: &BoxedExecutor,
    log: &Logger,
) -> Result<(), CmdError> {
    preflight::check_privileges()
        .map_err(|err| CmdError::Privilege(err.into()))?;
    preflight::check_distribution(plan, log);

    let packages: Vec<&str> =
        plan.dependencies.iter().map(String::as_str).collect();

    info!(log, "refreshing package index");
    Apt::update(executor).map_err(failure)?;
    info!(log, "installing dependency packages"; "packages" => ?packages);
    Apt::install(executor, &packages).map_err(failure)?;

    let client = reqwest::Client::new();
    repo::register_trust_key(plan, executor, &client, log)
        .await
        .map_err(failure)?;
    let written = repo::register_repository(plan, log).map_err(failure)?;

    // The new repository changes what the second refresh can see.
    info!(
        log, "refreshing package index against the vendor repository";
        "definition written" => written,
    );
    Apt::update(executor).map_err(failure)?;
    Apt::install(executor, &packages).map_err(failure)?;

    let artifact = fetch::fetch_installer(plan, &client, log)
        .await
        .map_err(failure)?;
    let installer = fetch::validate_installer(&artifact, log)
        .map_err(|err| CmdError::Validation(err.into()))?;
    fetch::run_installer(&installer, executor, log).map_err(failure)?;

    services::activate_services(plan, executor, log).map_err(failure)?;
    services::verify_services(plan, executor, log);

    info!(log, "bootstrap complete"; "services" => ?plan.services);
    Ok(())
}

/// Wraps a stage failure, carrying forward the exit code of the first
/// failed command in its cause chain, if any.
fn failure(err: impl Into<anyhow::Error>) -> CmdError {
    let err = err.into();
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ExecutionError>())
        .and_then(ExecutionError::exit_code);
    CmdError::Failure { code, err }
}

#[cfg(test)]
mod test {
    use super::*;
    use debian_utils::{FakeExecutor, StaticHandler};
    use slog::o;

    fn log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[test]
    fn test_failure_propagates_command_exit_code() {
        let executor = FakeExecutor::new(log());
        let mut handler = StaticHandler::new();
        handler.expect(
            debian_utils::host::input::Input::shell(
                "DEBIAN_FRONTEND=noninteractive /usr/bin/apt-get update",
            ),
            debian_utils::host::output::Output::exit_code(100),
        );
        handler.register(&executor);

        let err = Apt::update(&executor.as_executor())
            .map_err(failure)
            .expect_err("update fails");
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_failure_without_exit_status_maps_to_one() {
        let err = failure(anyhow::anyhow!("download failed"));
        assert_eq!(err.exit_code(), 1);
    }
}
