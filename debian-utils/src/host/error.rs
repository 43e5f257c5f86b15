// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors from executing commands on the host.

#[derive(Debug)]
pub struct CommandFailureInfo {
    pub command: String,
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl std::fmt::Display for CommandFailureInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command [{}] executed and failed with status: {}",
            self.command, self.status
        )?;
        write!(f, "  stdout: {}", self.stdout)?;
        write!(f, "  stderr: {}", self.stderr)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to start execution of [{command}]: {err}")]
    ExecutionStart { command: String, err: std::io::Error },

    #[error("{0}")]
    CommandFailure(Box<CommandFailureInfo>),
}

impl ExecutionError {
    /// The exit code of the failed command, when it ran and exited.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionError::ExecutionStart { .. } => None,
            ExecutionError::CommandFailure(info) => info.status.code(),
        }
    }

    /// True when the command could not be started because the program
    /// does not exist on this host.
    pub fn is_program_missing(&self) -> bool {
        match self {
            ExecutionError::ExecutionStart { err, .. } => {
                err.kind() == std::io::ErrorKind::NotFound
            }
            ExecutionError::CommandFailure(_) => false,
        }
    }
}
