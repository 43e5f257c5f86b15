// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unattended installer for the Wazuh all-in-one stack on Debian-family
//! hosts.
//!
//! The tool registers the Wazuh apt repository, downloads the vendor
//! install script, runs it unattended, then enables and sanity-checks
//! the resulting systemd services. All real install logic lives in the
//! vendor script; this crate only sequences the host around it.

mod config;
mod dispatch;
mod fetch;
mod preflight;
mod repo;
mod sequence;
mod services;

pub use config::BootstrapPlan;
pub use dispatch::BootstrapApp;
