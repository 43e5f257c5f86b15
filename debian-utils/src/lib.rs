// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wrappers around Debian host commands.

pub mod apt;
pub mod host;
pub mod systemctl;

pub use host::error::{CommandFailureInfo, ExecutionError};
pub use host::executor::{
    BoxedExecutor, Executor, FakeExecutor, HostExecutor, StaticHandler,
};

pub const APT_GET: &str = "/usr/bin/apt-get";
pub const SYSTEMCTL: &str = "/usr/bin/systemctl";
pub const GPG: &str = "/usr/bin/gpg";
pub const CHMOD: &str = "/usr/bin/chmod";
