// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::host::error::ExecutionError;
use crate::host::input::Input;
use crate::host::output::{output_to_exec_error, Output};

use async_trait::async_trait;
use itertools::Itertools;
use slog::{debug, error, info, Logger};
use std::process::Command;
use std::str::from_utf8;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub fn command_to_string(command: &Command) -> String {
    Input::from(command).to_string()
}

fn to_space_separated_string<T, I>(iter: T) -> String
where
    T: IntoIterator<Item = I>,
    I: std::fmt::Debug,
{
    Itertools::intersperse(
        iter.into_iter().map(|arg| format!("{arg:?}")),
        " ".into(),
    )
    .collect::<String>()
}

fn log_input(log: &Logger, id: u64, command: &Command) {
    info!(
        log,
        "running command via executor"; "id" => id, "command" => %Input::from(command)
    );
    debug!(
        log,
        "running command via executor"; "id" => id, "envs" => %to_space_separated_string(command.get_envs())
    );
}

fn log_output(log: &Logger, id: u64, output: &Output) {
    info!(
        log,
        "finished running command via executor";
        "id" => id,
        "result" => if output.status.success() { "OK" } else { "ERROR" },
        "status" => output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    if !output.stdout.is_empty() {
        debug!(
            log,
            "finished command stdout";
            "id" => id,
            "stdout" => from_utf8(&output.stdout).unwrap_or("<Not valid UTF-8>"),
        );
    }
    if !output.stderr.is_empty() {
        debug!(
            log,
            "finished command stderr";
            "id" => id,
            "stderr" => from_utf8(&output.stderr).unwrap_or("<Not valid UTF-8>"),
        );
    }
}

/// Describes the commonly-used "safe-to-reference" type describing the
/// Executor as a trait object.
pub type BoxedExecutor = Arc<dyn Executor>;

/// Describes an "executor", which can run [Command]s and return a response.
///
/// - In production, this is usually simply a [HostExecutor].
/// - Under test, this can be customized, and a [FakeExecutor] may be used.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes a task, waiting for it to complete, and returning output.
    async fn execute_async(
        &self,
        command: &mut tokio::process::Command,
    ) -> Result<Output, ExecutionError>;

    /// Executes a task, waiting for it to complete, and returning output.
    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError>;
}

/// Handler invoked by a [FakeExecutor] for each observed command.
pub type HandlerFn = dyn FnMut(Input) -> Output + Send + Sync;
pub type BoxedHandlerFn = Box<HandlerFn>;

struct FakeExecutorInner {
    log: Logger,
    counter: AtomicU64,
    handler: Mutex<BoxedHandlerFn>,
}

/// An executor which can expect certain inputs, and respond with specific
/// outputs.
pub struct FakeExecutor {
    inner: Arc<FakeExecutorInner>,
}

impl FakeExecutor {
    pub fn new(log: Logger) -> Arc<FakeExecutor> {
        Arc::new(Self {
            inner: Arc::new(FakeExecutorInner {
                log,
                counter: AtomicU64::new(0),
                handler: Mutex::new(Box::new(|_input| Output::success())),
            }),
        })
    }

    /// Set the handler to an arbitrary function.
    pub fn set_handler(&self, f: BoxedHandlerFn) {
        *self.inner.handler.lock().unwrap() = f;
    }

    /// Perform some type coercion to access a commonly-used trait object.
    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }

    fn execute_internal(
        &self,
        command: &Command,
    ) -> Result<Output, ExecutionError> {
        let id = self.inner.counter.fetch_add(1, Ordering::SeqCst);
        log_input(&self.inner.log, id, command);

        let output =
            self.inner.handler.lock().unwrap()(Input::from(command));
        log_output(&self.inner.log, id, &output);

        if !output.status.success() {
            return Err(output_to_exec_error(
                command_to_string(command),
                &output,
            ));
        }
        Ok(output)
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    // NOTE: We aren't actually performing any async operations -- it's up to
    // the caller to control the (synchronous) handlers.
    //
    // However, this still provides testability, while letting the "real
    // executor" make truly async calls while launching processes.
    async fn execute_async(
        &self,
        command: &mut tokio::process::Command,
    ) -> Result<Output, ExecutionError> {
        self.execute_internal(command.as_std())
    }

    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError> {
        self.execute_internal(command)
    }
}

pub struct HostExecutor {
    log: Logger,
    counter: AtomicU64,
}

impl HostExecutor {
    pub fn new(log: Logger) -> Arc<Self> {
        Arc::new(Self { log, counter: AtomicU64::new(0) })
    }

    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }

    fn prepare(&self, command: &Command) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        log_input(&self.log, id, command);
        id
    }

    fn finalize(
        &self,
        command: &Command,
        id: u64,
        output: Output,
    ) -> Result<Output, ExecutionError> {
        log_output(&self.log, id, &output);
        if !output.status.success() {
            return Err(output_to_exec_error(
                command_to_string(command),
                &output,
            ));
        }
        Ok(output)
    }
}

#[async_trait]
impl Executor for HostExecutor {
    async fn execute_async(
        &self,
        command: &mut tokio::process::Command,
    ) -> Result<Output, ExecutionError> {
        let id = self.prepare(command.as_std());
        let output = command.output().await.map_err(|err| {
            error!(self.log, "Could not start program asynchronously!"; "id" => id);
            ExecutionError::ExecutionStart {
                command: command_to_string(command.as_std()),
                err,
            }
        })?;
        self.finalize(command.as_std(), id, output.into())
    }

    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError> {
        let id = self.prepare(command);
        let output = command.output().map_err(|err| {
            error!(self.log, "Could not start program!"; "id" => id);
            ExecutionError::ExecutionStart {
                command: command_to_string(command),
                err,
            }
        })?;
        self.finalize(command, id, output.into())
    }
}

type DynamicHandler = Box<dyn FnMut(Input) -> Output + Send + Sync>;

enum HandledCommand {
    Static { input: Input, output: Output },
    Dynamic { handler: DynamicHandler },
}

/// A handler that may be used for setting inputs/outputs to the executor
/// when these commands are known ahead-of-time.
///
/// See: [Self::register] for integration with a [FakeExecutor].
pub struct StaticHandler {
    expected: Vec<HandledCommand>,
    index: usize,
}

impl StaticHandler {
    pub fn new() -> Self {
        Self { expected: Vec::new(), index: 0 }
    }

    /// Convenience function to register the handler with a [FakeExecutor].
    pub fn register(mut self, executor: &FakeExecutor) {
        executor.set_handler(Box::new(move |input| self.execute(input)));
    }

    /// Expects a static "input" to exactly produce some "output".
    pub fn expect(&mut self, input: Input, output: Output) {
        self.expected.push(HandledCommand::Static { input, output });
    }

    /// A helper for [Self::expect] which quietly succeeds.
    pub fn expect_ok<S: AsRef<str>>(&mut self, input: S) {
        self.expect(Input::shell(input), Output::success())
    }

    /// A helper for [Self::expect] which quietly fails.
    pub fn expect_fail<S: AsRef<str>>(&mut self, input: S) {
        self.expect(Input::shell(input), Output::failure())
    }

    /// Expects a dynamic handler to be invoked to dynamically
    /// determine the output of this call.
    pub fn expect_dynamic(&mut self, handler: DynamicHandler) {
        self.expected.push(HandledCommand::Dynamic { handler });
    }

    fn execute(&mut self, observed_input: Input) -> Output {
        let expected = &mut self
            .expected
            .get_mut(self.index)
            .unwrap_or_else(|| panic!("Unexpected command: {observed_input}"));
        self.index += 1;

        match expected {
            HandledCommand::Static { input, output } => {
                assert_eq!(&observed_input, input, "Unexpected input command");
                output.clone()
            }
            HandledCommand::Dynamic { ref mut handler } => {
                handler(observed_input)
            }
        }
    }
}

impl Default for StaticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StaticHandler {
    fn drop(&mut self) {
        let expected = self.expected.len();
        let actual = self.index;
        if actual < expected {
            let next = &self.expected[actual];
            let tip = match next {
                HandledCommand::Static { input, .. } => input.to_string(),
                HandledCommand::Dynamic { .. } => {
                    "<dynamic handler>".to_string()
                }
            };
            let errmsg = format!(
                "Only saw {actual} calls, expected {expected}\n\
                 Next would have been: {tip}"
            );
            if !std::thread::panicking() {
                assert!(false, "{errmsg}");
            } else {
                eprintln!("{errmsg}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use slog::o;

    fn log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[test]
    fn test_fake_executor_matches_expected_commands() {
        let executor = FakeExecutor::new(log());
        let mut handler = StaticHandler::new();
        handler.expect_ok("/usr/bin/systemctl daemon-reload");
        handler.expect_fail("/usr/bin/systemctl start wazuh-manager");
        handler.register(&executor);

        let executor = executor.as_executor();
        executor
            .execute(Command::new(crate::SYSTEMCTL).arg("daemon-reload"))
            .expect("first command succeeds");
        let err = executor
            .execute(
                Command::new(crate::SYSTEMCTL).args(["start", "wazuh-manager"]),
            )
            .expect_err("second command fails");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_fake_executor_returns_scripted_stdout() {
        let executor = FakeExecutor::new(log());
        let mut handler = StaticHandler::new();
        handler.expect(
            Input::shell("/usr/bin/systemctl list-unit-files"),
            Output::success().set_stdout("wazuh-manager.service enabled\n"),
        );
        handler.register(&executor);

        let output = executor
            .as_executor()
            .execute(Command::new(crate::SYSTEMCTL).arg("list-unit-files"))
            .expect("command succeeds");
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            "wazuh-manager.service enabled\n"
        );
    }

    #[test]
    #[should_panic(expected = "Unexpected command")]
    fn test_fake_executor_rejects_unexpected_commands() {
        let executor = FakeExecutor::new(log());
        StaticHandler::new().register(&executor);
        let _ = executor
            .as_executor()
            .execute(&mut Command::new("/usr/bin/unexpected"));
    }
}
