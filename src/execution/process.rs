//! Execution bridge backed by a child process
//!
//! Each run gets a fresh temporary directory holding the bundle. The
//! interpreter is started there with the suite files as trailing arguments.
//! Its stdout is read line by line: lines holding a JSON worker payload are
//! translated into messages, anything else is console text. Stderr is
//! relayed as console text as well.

use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::queue::{RunSender, RunStream, run_channel};
use super::{BridgeMessage, ExecutionBridge, ExecutionError, KeywordCallback, RunBundle, RunOutcome};

/// Environment variable overriding the interpreter command line.
pub const INTERPRETER_ENV: &str = "ROBOT_LS_INTERPRETER";

/// Report file produced by the interpreter in its working directory.
pub const REPORT_FILE: &str = "log.html";

const DEFAULT_PROGRAM: &str = "python3";
const DEFAULT_ARGS: [&str; 6] = ["-m", "robot", "--consolecolors", "ansi", "--loglevel", "TRACE:INFO"];

/// Program and leading arguments used to run suites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

impl InterpreterConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace separated command line. `None` if it is blank.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Resolves the interpreter to use.
    ///
    /// Checks in order:
    /// 1. Environment variable ROBOT_LS_INTERPRETER
    /// 2. Explicit initialization option
    /// 3. `fallback` (command line flags or the built-in default)
    pub fn from_env_or(init_option: Option<&str>, fallback: Self) -> Self {
        Self::resolve(std::env::var(INTERPRETER_ENV).ok().as_deref(), init_option, fallback)
    }

    fn resolve(env_value: Option<&str>, init_option: Option<&str>, fallback: Self) -> Self {
        for (source, value) in [(INTERPRETER_ENV, env_value), ("initializationOptions", init_option)] {
            if let Some(value) = value {
                match Self::parse(value) {
                    Some(config) => {
                        debug!("Interpreter taken from {}: {}", source, config);
                        return config;
                    }
                    None => warn!("Ignoring blank interpreter setting from {}", source),
                }
            }
        }
        fallback
    }
}

impl std::fmt::Display for InterpreterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs bundles with an external interpreter.
#[derive(Debug, Clone, Default)]
pub struct ProcessBridge {
    interpreter: InterpreterConfig,
}

impl ProcessBridge {
    pub fn new(interpreter: InterpreterConfig) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &InterpreterConfig {
        &self.interpreter
    }
}

impl ExecutionBridge for ProcessBridge {
    fn start(&self, bundle: RunBundle) -> RunStream {
        let (sender, stream) = run_channel();
        let interpreter = self.interpreter.clone();

        tokio::spawn(async move {
            let outcome = match run_interpreter(&interpreter, &bundle, &sender).await {
                Ok(exit_code) => RunOutcome::Completed { exit_code },
                Err(ExecutionError::Cancelled) => {
                    info!("Run abandoned, interpreter stopped");
                    return;
                }
                Err(e) => {
                    warn!("Run failed: {}", e);
                    RunOutcome::TransportFailed(e.to_string())
                }
            };
            sender.finish(outcome);
        });

        stream
    }

    fn bridge_name(&self) -> String {
        format!("process ({})", self.interpreter)
    }
}

/// Runs the interpreter to completion and returns its exit code.
async fn run_interpreter(
    interpreter: &InterpreterConfig,
    bundle: &RunBundle,
    sender: &RunSender,
) -> Result<Option<i32>, ExecutionError> {
    let workdir = tempfile::Builder::new()
        .prefix("robot-run-")
        .tempdir()
        .map_err(|source| ExecutionError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
    bundle.write_to(workdir.path())?;
    debug!("Run bundle written to {}", workdir.path().display());

    let mut child = Command::new(&interpreter.program)
        .args(&interpreter.args)
        .args(bundle.entry_files())
        .current_dir(workdir.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecutionError::Spawn {
            program: interpreter.program.clone(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecutionError::Transport("interpreter stdout missing".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecutionError::Transport("interpreter stderr missing".to_string()))?;

    let mut stdout = LossyLines::new(stdout);
    let mut stderr = LossyLines::new(stderr);
    let (mut stdout_open, mut stderr_open) = (true, true);
    let mut report_sent = false;

    let pipe_error = |source| ExecutionError::Io {
        path: workdir.path().to_path_buf(),
        source,
    };

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout.next_line(), if stdout_open => match line.map_err(pipe_error)? {
                Some(line) => {
                    for message in translate_line(&line) {
                        report_sent |= matches!(message, BridgeMessage::HtmlReport(_));
                        if !forward(sender, message) {
                            return Err(ExecutionError::Cancelled);
                        }
                    }
                }
                None => stdout_open = false,
            },
            line = stderr.next_line(), if stderr_open => match line.map_err(pipe_error)? {
                Some(line) => {
                    if !sender.output(format!("{}\n", line)) {
                        return Err(ExecutionError::Cancelled);
                    }
                }
                None => stderr_open = false,
            },
            _ = sender.closed() => return Err(ExecutionError::Cancelled),
        }
    }

    let status = child.wait().await.map_err(pipe_error)?;
    debug!("Interpreter exited with {}", status);

    if !report_sent {
        if let Some(html) = read_report(workdir.path())? {
            sender.report(html);
        }
    }

    Ok(status.code())
}

/// Line reader for interpreter pipes.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD instead of
/// failing the run.
struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next line without its line ending, or `None` at end of stream.
    ///
    /// Cancel safe: bytes read before a cancellation stay in `buf` and are
    /// completed by the next call.
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut line: &[u8] = &self.buf;
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped.strip_suffix(b"\r").unwrap_or(stripped);
        }
        let decoded = String::from_utf8_lossy(line).into_owned();
        self.buf.clear();
        Ok(Some(decoded))
    }
}

fn forward(sender: &RunSender, message: BridgeMessage) -> bool {
    match message {
        BridgeMessage::StdOutput(text) => sender.output(text),
        BridgeMessage::HtmlReport(html) => sender.report(html),
        BridgeMessage::KeywordCallback(callback) => sender.keyword_callback(callback),
        // Termination is decided by the process exit, not by the worker.
        BridgeMessage::Finished(_) => true,
    }
}

fn read_report(dir: &Path) -> Result<Option<String>, ExecutionError> {
    let path = dir.join(REPORT_FILE);
    match std::fs::read_to_string(&path) {
        Ok(html) => Ok(Some(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} produced", REPORT_FILE);
            Ok(None)
        }
        Err(source) => Err(ExecutionError::Io { path, source }),
    }
}

/// Structured message a worker may print as one JSON line.
#[derive(Debug, Default, Deserialize)]
struct WorkerPayload {
    std_output: Option<String>,
    html: Option<String>,
    keyword: Option<String>,
    locator: Option<String>,
    text: Option<String>,
    url: Option<String>,
    #[serde(default)]
    finished: bool,
}

impl WorkerPayload {
    fn into_messages(self) -> Vec<BridgeMessage> {
        let mut messages = Vec::new();

        if let Some(keyword) = self.keyword {
            messages.push(BridgeMessage::KeywordCallback(KeywordCallback {
                keyword,
                locator: self.locator.unwrap_or_default(),
                text: self.text,
                url: self.url,
            }));
            return messages;
        }
        if let Some(text) = self.std_output {
            messages.push(BridgeMessage::StdOutput(text));
        }
        if let Some(html) = self.html {
            messages.push(BridgeMessage::HtmlReport(html));
        }
        if self.finished {
            debug!("Worker reported completion");
        }
        messages
    }
}

/// Translates one stdout line into messages.
fn translate_line(line: &str) -> Vec<BridgeMessage> {
    let trimmed = line.trim();
    if trimmed.starts_with('{') {
        if let Ok(payload) = serde_json::from_str::<WorkerPayload>(trimmed) {
            let messages = payload.into_messages();
            if !messages.is_empty() {
                return messages;
            }
        }
    }
    vec![BridgeMessage::StdOutput(format!("{}\n", line))]
}
