// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bootstrap plan: every endpoint, path, and name the sequence
//! touches, in one substitutable place.

use camino::Utf8PathBuf;

/// Default Wazuh release to install.
pub const DEFAULT_RELEASE: &str = "4.7";

const DEFAULT_BASE_URL: &str = "https://packages.wazuh.com";
const KEYRING_PATH: &str = "/usr/share/keyrings/wazuh.gpg";
const SOURCES_PATH: &str = "/etc/apt/sources.list.d/wazuh.list";
const OS_RELEASE_PATH: &str = "/etc/os-release";
const FILEBEAT_BIN: &str = "/usr/bin/filebeat";
const INSTALLER_FILE_NAME: &str = "wazuh-install.sh";

/// Everything the provisioning sequence needs to know about the host
/// and the vendor endpoints.
///
/// Production runs use [`BootstrapPlan::default`]; tests substitute
/// paths and URLs field by field.
#[derive(Clone, Debug)]
pub struct BootstrapPlan {
    /// Vendor release to install, e.g. `4.7`.
    pub release: String,
    /// Base URL of the vendor package host.
    pub base_url: String,
    /// Binary trust-key store registered with apt.
    pub keyring_path: Utf8PathBuf,
    /// Repository-definition file registered with apt.
    pub sources_path: Utf8PathBuf,
    /// Directory the installer script is downloaded into.
    pub work_dir: Utf8PathBuf,
    /// OS packages required before the vendor installer can run.
    pub dependencies: Vec<String>,
    /// Services the vendor installer is expected to deliver.
    pub services: Vec<String>,
    pub os_release_path: Utf8PathBuf,
    /// Expected `ID=` value in the os-release file.
    pub distro_id: String,
    /// Log-shipping helper probed during post-install verification.
    pub filebeat_bin: Utf8PathBuf,
}

impl Default for BootstrapPlan {
    fn default() -> Self {
        BootstrapPlan {
            release: DEFAULT_RELEASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            keyring_path: KEYRING_PATH.into(),
            sources_path: SOURCES_PATH.into(),
            work_dir: ".".into(),
            dependencies: [
                "apt-transport-https",
                "ca-certificates",
                "curl",
                "gnupg",
                "lsb-release",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            services: ["wazuh-manager", "wazuh-indexer", "wazuh-dashboard"]
                .into_iter()
                .map(String::from)
                .collect(),
            os_release_path: OS_RELEASE_PATH.into(),
            distro_id: "ubuntu".to_string(),
            filebeat_bin: FILEBEAT_BIN.into(),
        }
    }
}

impl BootstrapPlan {
    /// URL of the ASCII-armored trust key.
    pub fn key_url(&self) -> String {
        format!("{}/key/GPG-KEY-WAZUH", self.base_url)
    }

    /// URL of the versioned vendor install script.
    pub fn installer_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.release, INSTALLER_FILE_NAME)
    }

    /// URL of the apt repository for this release series.
    pub fn repo_url(&self) -> String {
        let series = self.release.split('.').next().unwrap_or(&self.release);
        format!("{}/{}.x/apt/", self.base_url, series)
    }

    /// Local path the installer script is downloaded to.
    pub fn installer_path(&self) -> Utf8PathBuf {
        self.work_dir.join(INSTALLER_FILE_NAME)
    }

    /// The single-line repository definition registered with apt,
    /// pinned to the trust-key store.
    pub fn repo_definition(&self) -> String {
        format!(
            "deb [signed-by={}] {} stable main\n",
            self.keyring_path,
            self.repo_url(),
        )
    }

    /// A copy of this plan rooted at `dir` for temporary-directory
    /// testing.
    #[cfg(test)]
    pub fn rooted_at(dir: &camino::Utf8Path) -> Self {
        BootstrapPlan {
            keyring_path: dir.join("wazuh.gpg"),
            sources_path: dir.join("wazuh.list"),
            work_dir: dir.to_path_buf(),
            os_release_path: dir.join("os-release"),
            filebeat_bin: dir.join("filebeat"),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_urls_follow_release() {
        let plan = BootstrapPlan::default();
        assert_eq!(
            plan.installer_url(),
            "https://packages.wazuh.com/4.7/wazuh-install.sh"
        );
        assert_eq!(plan.repo_url(), "https://packages.wazuh.com/4.x/apt/");
        assert_eq!(
            plan.key_url(),
            "https://packages.wazuh.com/key/GPG-KEY-WAZUH"
        );

        let plan =
            BootstrapPlan { release: "5.0".to_string(), ..Default::default() };
        assert_eq!(
            plan.installer_url(),
            "https://packages.wazuh.com/5.0/wazuh-install.sh"
        );
        assert_eq!(plan.repo_url(), "https://packages.wazuh.com/5.x/apt/");
    }

    #[test]
    fn test_repo_definition_pins_keyring() {
        let plan = BootstrapPlan::default();
        assert_eq!(
            plan.repo_definition(),
            "deb [signed-by=/usr/share/keyrings/wazuh.gpg] \
             https://packages.wazuh.com/4.x/apt/ stable main\n"
        );
    }
}
