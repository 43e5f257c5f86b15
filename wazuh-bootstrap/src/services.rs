// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Activation and post-install verification of the installed services.

use anyhow::Context;
use slog::{info, warn, Logger};

use debian_utils::systemctl::Systemctl;
use debian_utils::BoxedExecutor;

use crate::config::BootstrapPlan;

/// Enables and starts each expected service whose unit is known to
/// systemd. An unknown unit is a warning, not a failure: the vendor
/// installer may legitimately rename or consolidate services across
/// versions. Failures on a *known* unit do abort.
pub fn activate_services(
    plan: &BootstrapPlan,
    executor: &BoxedExecutor,
    log: &Logger,
) -> anyhow::Result<()> {
    // The vendor installer drops new unit files; make sure systemd has
    // seen them before we ask about any unit.
    Systemctl::daemon_reload(executor)
        .context("failed to reload the systemd manager configuration")?;

    for unit in &plan.services {
        let known = Systemctl::unit_exists(executor, unit)
            .with_context(|| format!("failed to look up unit '{unit}'"))?;
        if !known {
            warn!(
                log,
                "service unit not found; the installed release may have \
                 renamed it";
                "unit" => unit,
            );
            continue;
        }

        info!(log, "enabling and starting service"; "unit" => unit);
        Systemctl::enable_and_start(executor, unit).with_context(|| {
            format!("failed to enable and start unit '{unit}'")
        })?;
    }
    Ok(())
}

/// Reports consolidated service status and, when the log-shipping
/// helper is installed, exercises its output connectivity self-test.
/// Purely observational: nothing here can fail the sequence.
pub fn verify_services(
    plan: &BootstrapPlan,
    executor: &BoxedExecutor,
    log: &Logger,
) {
    for unit in &plan.services {
        match Systemctl::status(executor, unit) {
            Ok(report) => {
                info!(
                    log, "service status";
                    "unit" => unit,
                    "report" => report.trim(),
                );
            }
            Err(err) => {
                warn!(
                    log, "could not query service status";
                    "unit" => unit,
                    "err" => %err,
                );
            }
        }
    }

    if !plan.filebeat_bin.exists() {
        info!(
            log, "log shipper not installed; skipping output self-test";
            "path" => %&plan.filebeat_bin,
        );
        return;
    }

    info!(log, "running log shipper output self-test");
    let mut cmd = std::process::Command::new(plan.filebeat_bin.as_str());
    let cmd = cmd.args(["test", "output"]);
    match executor.execute(cmd) {
        Ok(output) => {
            info!(
                log, "log shipper self-test passed";
                "report" => String::from_utf8_lossy(&output.stdout).trim(),
            );
        }
        Err(err) => {
            warn!(
                log, "log shipper self-test failed; continuing";
                "err" => %err,
            );
        }
    }
}
