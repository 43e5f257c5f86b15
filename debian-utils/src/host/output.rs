// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The observed result of an executed command.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use crate::host::error::{CommandFailureInfo, ExecutionError};

/// Status and captured streams of a finished command.
#[derive(Clone, Debug)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    /// An output that exited zero with empty streams.
    pub fn success() -> Self {
        Self::exit_code(0)
    }

    /// An output that exited one with empty streams.
    pub fn failure() -> Self {
        Self::exit_code(1)
    }

    /// An output carrying an arbitrary exit code.
    pub fn exit_code(code: i32) -> Self {
        Output {
            // Wait-status encoding: exit code in the second byte.
            status: ExitStatus::from_raw((code & 0xff) << 8),
            stdout: vec![],
            stderr: vec![],
        }
    }

    pub fn set_stdout<S: Into<Vec<u8>>>(mut self, stdout: S) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn set_stderr<S: Into<Vec<u8>>>(mut self, stderr: S) -> Self {
        self.stderr = stderr.into();
        self
    }
}

impl From<std::process::Output> for Output {
    fn from(output: std::process::Output) -> Self {
        Output {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

pub fn output_to_exec_error(
    command: String,
    output: &Output,
) -> ExecutionError {
    ExecutionError::CommandFailure(Box::new(CommandFailureInfo {
        command,
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exit_code_round_trips() {
        assert_eq!(Output::success().status.code(), Some(0));
        assert_eq!(Output::failure().status.code(), Some(1));
        assert_eq!(Output::exit_code(42).status.code(), Some(42));
        assert!(Output::success().status.success());
        assert!(!Output::failure().status.success());
    }

    #[test]
    fn test_exec_error_carries_streams() {
        let output = Output::failure()
            .set_stdout("some stdout")
            .set_stderr("some stderr");
        let err = output_to_exec_error("prog arg".to_string(), &output);
        match err {
            ExecutionError::CommandFailure(info) => {
                assert_eq!(info.stdout, "some stdout");
                assert_eq!(info.stderr, "some stderr");
                assert_eq!(info.status.code(), Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
