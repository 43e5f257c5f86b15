// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A command about to be executed, in a comparable form.

use std::collections::BTreeMap;
use std::process::Command;

/// The program, arguments, and environment overrides of a command.
///
/// Used both for logging and for matching expected commands against
/// observed ones under a fake executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub program: String,
    pub args: Vec<String>,
    pub envs: BTreeMap<String, String>,
}

impl Input {
    /// Parses a shell-like line: leading `KEY=VALUE` tokens become
    /// environment overrides, the next token is the program, and the
    /// remainder are arguments. No quoting is interpreted.
    pub fn shell<S: AsRef<str>>(input: S) -> Self {
        let mut envs = BTreeMap::new();
        let mut tokens = input.as_ref().split_whitespace().peekable();

        while let Some(token) = tokens.peek() {
            match token.split_once('=') {
                Some((key, value)) => {
                    envs.insert(key.to_string(), value.to_string());
                    tokens.next();
                }
                None => break,
            }
        }

        let program = tokens.next().unwrap_or_default().to_string();
        let args = tokens.map(|s| s.to_string()).collect();
        Input { program, args, envs }
    }
}

impl From<&Command> for Input {
    fn from(command: &Command) -> Self {
        Input {
            program: command.get_program().to_string_lossy().to_string(),
            args: command
                .get_args()
                .map(|s| s.to_string_lossy().to_string())
                .collect(),
            envs: command
                .get_envs()
                .filter_map(|(key, value)| {
                    value.map(|value| {
                        (
                            key.to_string_lossy().to_string(),
                            value.to_string_lossy().to_string(),
                        )
                    })
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shell_round_trips_through_display() {
        let line = "DEBIAN_FRONTEND=noninteractive /usr/bin/apt-get \
                    install -y curl";
        let input = Input::shell(line);
        assert_eq!(input.program, "/usr/bin/apt-get");
        assert_eq!(input.args, vec!["install", "-y", "curl"]);
        assert_eq!(
            input.envs.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
        assert_eq!(Input::shell(input.to_string()), input);
    }

    #[test]
    fn test_shell_matches_command() {
        let mut command = Command::new("/usr/bin/systemctl");
        command.args(["enable", "wazuh-manager"]);
        assert_eq!(
            Input::from(&command),
            Input::shell("/usr/bin/systemctl enable wazuh-manager"),
        );
    }
}
