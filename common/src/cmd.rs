// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facilities for command-line tools at the process boundary.

use std::process::exit;

/// Represents a failure to execute a command, categorized by the exit
/// code it must produce.
#[derive(Debug)]
pub enum CmdError {
    /// The process lacks the privileges required to run at all.
    Privilege(anyhow::Error),

    /// A downloaded artifact failed shape validation.
    Validation(anyhow::Error),

    /// Any other failure. When the root cause is a command that exited
    /// with a code, that code is carried here and propagated unmodified.
    Failure { code: Option<i32>, err: anyhow::Error },
}

impl CmdError {
    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            CmdError::Privilege(_) => 1,
            CmdError::Validation(_) => 2,
            CmdError::Failure { code, .. } => code.unwrap_or(1),
        }
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            CmdError::Privilege(err) => err,
            CmdError::Validation(err) => err,
            CmdError::Failure { err, .. } => err,
        }
    }
}

/// Prints the name with which the program was invoked.
pub fn progname() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|path| path.file_name())
        .map(|base| base.to_string_lossy().into_owned())
        .unwrap_or_else(|| "command".to_string())
}

/// Exits the current process on a fatal error, printing the error chain
/// to stderr.
pub fn fatal(cmd_error: CmdError) -> ! {
    eprintln!("{}: {:#}", progname(), cmd_error.error());
    exit(cmd_error.exit_code());
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(CmdError::Privilege(anyhow!("no")).exit_code(), 1);
        assert_eq!(CmdError::Validation(anyhow!("bad")).exit_code(), 2);
        assert_eq!(
            CmdError::Failure { code: Some(100), err: anyhow!("apt") }
                .exit_code(),
            100
        );
        assert_eq!(
            CmdError::Failure { code: None, err: anyhow!("io") }.exit_code(),
            1
        );
    }
}
