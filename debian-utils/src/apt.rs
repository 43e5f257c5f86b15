// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utilities for driving the apt package manager.

use crate::host::executor::BoxedExecutor;
use crate::{ExecutionError, APT_GET};

/// Environment override making apt suppress all interactive prompts.
const NONINTERACTIVE: (&str, &str) = ("DEBIAN_FRONTEND", "noninteractive");

#[derive(thiserror::Error, Debug)]
#[error("Failed to refresh package index: {err}")]
pub struct UpdateError {
    #[from]
    err: ExecutionError,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to install packages {packages:?}: {err}")]
pub struct InstallError {
    packages: Vec<String>,
    #[source]
    err: ExecutionError,
}

/// Wraps commands for interacting with apt.
pub struct Apt {}

impl Apt {
    /// Refreshes the package index. Safe to repeat; apt treats it as a
    /// full re-read of all configured sources.
    pub fn update(executor: &BoxedExecutor) -> Result<(), UpdateError> {
        let mut cmd = std::process::Command::new(APT_GET);
        let cmd = cmd.env(NONINTERACTIVE.0, NONINTERACTIVE.1).arg("update");
        executor.execute(cmd)?;
        Ok(())
    }

    /// Installs the named packages non-interactively. Packages already
    /// at the requested version are no-ops for apt.
    pub fn install(
        executor: &BoxedExecutor,
        packages: &[&str],
    ) -> Result<(), InstallError> {
        let mut cmd = std::process::Command::new(APT_GET);
        let cmd = cmd
            .env(NONINTERACTIVE.0, NONINTERACTIVE.1)
            .args(["install", "-y"])
            .args(packages);
        executor.execute(cmd).map_err(|err| InstallError {
            packages: packages.iter().map(|p| p.to_string()).collect(),
            err,
        })?;
        Ok(())
    }
}
