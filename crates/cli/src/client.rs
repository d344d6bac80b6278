use keeper_core::{CliResult, KeeperError};
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Name of the external threshold tool.
pub const CLI_COMMAND: &str = "a14-charge-keeper";

/// Hard limit for a single invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A subcommand of the external tool together with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// Read-only status query.
    Status,
    /// Set the end threshold until the next reboot.
    Set(u8),
    /// Set the end threshold and keep it across boot/resume.
    Persist(u8),
    /// Remove the limit (charge to 100%).
    Clear,
}

impl Subcommand {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Status => vec!["status".into()],
            Self::Set(pct) => vec!["set".into(), pct.to_string()],
            Self::Persist(pct) => vec!["persist".into(), pct.to_string()],
            Self::Clear => vec!["clear".into()],
        }
    }

    /// Mutating subcommands need elevated privilege.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Status)
    }
}

/// How mutating subcommands obtain elevated privilege.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Elevation {
    /// Run the tool directly (the process already has the privilege).
    #[default]
    Direct,
    /// Prefix the invocation with a wrapper, e.g. `["pkexec"]` or `["sudo", "-n"]`.
    Wrapper(Vec<String>),
}

impl Elevation {
    /// Build an elevation strategy from a whitespace-separated wrapper command.
    /// An empty string means direct invocation.
    pub fn from_command_line(wrapper: &str) -> Self {
        let parts: Vec<String> = wrapper.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            Self::Direct
        } else {
            Self::Wrapper(parts)
        }
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion within a time limit.
///
/// Failures to spawn are reported with the underlying `io::ErrorKind`
/// (`NotFound` for a missing executable, `TimedOut` when the limit expired).
pub trait CommandRunner: Send {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> io::Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes concurrently so a chatty child can't block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill timed-out '{program}': {e}");
                }
                let _ = child.wait();
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("'{program}' exceeded {}s", timeout.as_secs()),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A background process spawned by the child may still hold the pipes
        // open; the deadline bounds the wait for them as well.
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);
        match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => Ok(CommandOutput {
                code: status.code(),
                stdout,
                stderr,
            }),
            _ => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("'{program}' output still open after {}s", timeout.as_secs()),
            )),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Wait for a drained pipe until `deadline`; `None` if it is still open.
fn collect(pipe: Option<mpsc::Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(rx) = pipe else {
        return Some(String::new());
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Some(text),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
        Err(mpsc::RecvTimeoutError::Disconnected) => Some(String::new()),
    }
}

/// Gateway to the external `a14-charge-keeper` tool.
///
/// Every invocation blocks until the tool exits or the timeout expires and
/// returns a [`CliResult`] carrying either stdout or a user-facing message.
pub struct CliGateway {
    program: String,
    timeout: Duration,
    elevation: Elevation,
    runner: Box<dyn CommandRunner>,
}

impl Default for CliGateway {
    fn default() -> Self {
        Self::new(SystemRunner)
    }
}

impl std::fmt::Debug for CliGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliGateway")
            .field("program", &self.program)
            .field("timeout", &self.timeout)
            .field("elevation", &self.elevation)
            .finish_non_exhaustive()
    }
}

impl CliGateway {
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            program: CLI_COMMAND.to_string(),
            timeout: DEFAULT_TIMEOUT,
            elevation: Elevation::Direct,
            runner: Box::new(runner),
        }
    }

    #[must_use]
    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = elevation;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the tool binary (e.g. an absolute path).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    /// Run `subcommand` and return the tool's raw stdout on success.
    pub fn run(&self, subcommand: Subcommand) -> CliResult<String> {
        let (program, args) = self.command_line(subcommand);
        debug!("Executing: {program} {}", args.join(" "));

        let output = self
            .runner
            .run(&program, &args, self.timeout)
            .map_err(|e| self.map_spawn_error(e))?;

        debug!("'{}' exited with {:?}", self.program, output.code);

        if output.success() {
            return Ok(output.stdout);
        }

        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            "Unknown CLI error".to_string()
        } else {
            stderr.to_string()
        };
        Err(KeeperError::ExternalTool(message))
    }

    /// Program and argument vector for `subcommand`, with the elevation
    /// prefix applied to mutating subcommands.
    fn command_line(&self, subcommand: Subcommand) -> (String, Vec<String>) {
        let tool_args = subcommand.args();
        match &self.elevation {
            Elevation::Wrapper(prefix) if subcommand.is_mutating() => {
                let mut parts = prefix.iter().cloned();
                // An empty wrapper degrades to a direct call.
                let Some(program) = parts.next() else {
                    return (self.program.clone(), tool_args);
                };
                let args = parts
                    .chain(std::iter::once(self.program.clone()))
                    .chain(tool_args)
                    .collect();
                (program, args)
            }
            _ => (self.program.clone(), tool_args),
        }
    }

    fn map_spawn_error(&self, err: io::Error) -> KeeperError {
        let message = match err.kind() {
            io::ErrorKind::NotFound => {
                format!("{} not found. Please install the CLI tool first.", self.program)
            }
            io::ErrorKind::TimedOut => {
                format!("Command timed out after {} seconds", self.timeout.as_secs())
            }
            _ => format!("Unexpected error: {err}"),
        };
        KeeperError::ExternalTool(message)
    }
}
