// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Privilege and host environment checks run before anything touches
//! the system.

use nix::unistd::Uid;
use slog::{info, warn, Logger};

use crate::config::BootstrapPlan;

#[derive(thiserror::Error, Debug)]
#[error(
    "this tool must run with root privileges (effective uid {euid}); \
     re-run it under sudo"
)]
pub struct PrivilegeError {
    euid: u32,
}

/// Fails unless the process runs with an effective uid of root. Nothing
/// else in the sequence may run before this check.
pub fn check_privileges() -> Result<(), PrivilegeError> {
    check_euid(Uid::effective())
}

fn check_euid(euid: Uid) -> Result<(), PrivilegeError> {
    if euid.is_root() {
        Ok(())
    } else {
        Err(PrivilegeError { euid: euid.as_raw() })
    }
}

/// Warns, without failing, when the host os-release file is missing or
/// does not identify the expected distribution. The vendor installer
/// itself decides whether it can proceed on an unexpected host.
pub fn check_distribution(plan: &BootstrapPlan, log: &Logger) {
    match std::fs::read_to_string(&plan.os_release_path) {
        Ok(contents) => {
            if os_release_matches(&contents, &plan.distro_id) {
                info!(
                    log, "host distribution matches";
                    "distro" => &plan.distro_id,
                );
            } else {
                warn!(
                    log,
                    "host does not appear to be the expected distribution; \
                     continuing anyway";
                    "expected" => &plan.distro_id,
                    "os release file" => %&plan.os_release_path,
                );
            }
        }
        Err(err) => {
            warn!(
                log,
                "could not read the os-release file; continuing anyway";
                "os release file" => %&plan.os_release_path,
                "err" => %err,
            );
        }
    }
}

/// Whether the os-release `ID=` field names the expected distribution.
fn os_release_matches(contents: &str, distro_id: &str) -> bool {
    contents.lines().any(|line| {
        line.strip_prefix("ID=")
            .map(|id| id.trim_matches('"') == distro_id)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const UBUNTU_OS_RELEASE: &str = "\
PRETTY_NAME=\"Ubuntu 22.04.4 LTS\"
NAME=\"Ubuntu\"
VERSION_ID=\"22.04\"
ID=ubuntu
ID_LIKE=debian
";

    const DEBIAN_OS_RELEASE: &str = "\
PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"
NAME=\"Debian GNU/Linux\"
ID=debian
";

    #[test]
    fn test_root_check() {
        assert!(check_euid(Uid::from_raw(0)).is_ok());
        let err = check_euid(Uid::from_raw(1000)).expect_err("not root");
        assert!(err.to_string().contains("effective uid 1000"));
    }

    #[test]
    fn test_os_release_matching() {
        assert!(os_release_matches(UBUNTU_OS_RELEASE, "ubuntu"));
        assert!(!os_release_matches(UBUNTU_OS_RELEASE, "debian"));
        assert!(os_release_matches(DEBIAN_OS_RELEASE, "debian"));
        // Quoted IDs match too.
        assert!(os_release_matches("ID=\"ubuntu\"\n", "ubuntu"));
        // ID_LIKE and other fields must not satisfy the check.
        assert!(!os_release_matches("ID_LIKE=debian\n", "debian"));
        assert!(!os_release_matches("", "ubuntu"));
    }
}
