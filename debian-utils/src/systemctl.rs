// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utilities for driving systemd units.

use crate::host::executor::BoxedExecutor;
use crate::{ExecutionError, SYSTEMCTL};

#[derive(thiserror::Error, Debug)]
#[error("Failed to reload the systemd manager configuration: {err}")]
pub struct DaemonReloadError {
    #[from]
    err: ExecutionError,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to list unit files: {err}")]
pub struct UnitListError {
    #[from]
    err: ExecutionError,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to enable unit '{unit}': {err}")]
pub struct EnableError {
    unit: String,
    #[source]
    err: ExecutionError,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to start unit '{unit}': {err}")]
pub struct StartError {
    unit: String,
    #[source]
    err: ExecutionError,
}

#[derive(thiserror::Error, Debug)]
pub enum ActivateError {
    #[error(transparent)]
    Enable(#[from] EnableError),

    #[error(transparent)]
    Start(#[from] StartError),
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to query status of unit '{unit}': {err}")]
pub struct StatusError {
    unit: String,
    #[source]
    err: ExecutionError,
}

/// Wraps commands for interacting with systemd.
pub struct Systemctl {}

impl Systemctl {
    /// Reloads the systemd manager configuration, picking up unit files
    /// dropped onto disk since boot.
    pub fn daemon_reload(
        executor: &BoxedExecutor,
    ) -> Result<(), DaemonReloadError> {
        let mut cmd = std::process::Command::new(SYSTEMCTL);
        let cmd = cmd.arg("daemon-reload");
        executor.execute(cmd)?;
        Ok(())
    }

    /// Whether `unit` is known to systemd.
    ///
    /// Presence is decided by scanning the full unit-file listing rather
    /// than from the exit status of a filtered listing, which varies
    /// across systemd versions.
    pub fn unit_exists(
        executor: &BoxedExecutor,
        unit: &str,
    ) -> Result<bool, UnitListError> {
        let mut cmd = std::process::Command::new(SYSTEMCTL);
        let cmd = cmd.args(["list-unit-files", "--no-legend", "--no-pager"]);
        let output = executor.execute(cmd)?;
        Ok(unit_in_listing(&String::from_utf8_lossy(&output.stdout), unit))
    }

    /// Enables `unit` and immediately starts it.
    pub fn enable_and_start(
        executor: &BoxedExecutor,
        unit: &str,
    ) -> Result<(), ActivateError> {
        let mut cmd = std::process::Command::new(SYSTEMCTL);
        let cmd = cmd.args(["enable", unit]);
        executor.execute(cmd).map_err(|err| EnableError {
            unit: unit.to_string(),
            err,
        })?;

        let mut cmd = std::process::Command::new(SYSTEMCTL);
        let cmd = cmd.args(["start", unit]);
        executor.execute(cmd).map_err(|err| StartError {
            unit: unit.to_string(),
            err,
        })?;
        Ok(())
    }

    /// Queries the status of `unit`, returning systemd's human-readable
    /// report. An inactive or failed unit makes `systemctl status` exit
    /// non-zero, which surfaces here as an error carrying the report.
    pub fn status(
        executor: &BoxedExecutor,
        unit: &str,
    ) -> Result<String, StatusError> {
        let mut cmd = std::process::Command::new(SYSTEMCTL);
        let cmd = cmd.args(["status", "--no-pager", unit]);
        let output = executor.execute(cmd).map_err(|err| StatusError {
            unit: unit.to_string(),
            err,
        })?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn unit_in_listing(listing: &str, unit: &str) -> bool {
    let wanted = if unit.contains('.') {
        unit.to_string()
    } else {
        format!("{unit}.service")
    };
    listing
        .lines()
        .any(|line| line.split_whitespace().next() == Some(wanted.as_str()))
}
