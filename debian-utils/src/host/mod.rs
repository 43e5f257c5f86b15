// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process execution through a substitutable [`executor::Executor`].
//!
//! Production code runs commands on the real host via
//! [`executor::HostExecutor`]; tests script command outcomes with
//! [`executor::FakeExecutor`] and [`executor::StaticHandler`].

pub mod error;
pub mod executor;
pub mod input;
pub mod output;
