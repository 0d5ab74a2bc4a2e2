//! Test execution
//!
//! A run hands a snapshot of the editor's files to an [`ExecutionBridge`] and
//! consumes the ordered messages it produces. Every run ends with exactly one
//! [`BridgeMessage::Finished`]; nothing follows it.
//!
//! The [`RunCoordinator`] owns the bridge and enforces that at most one run is
//! in flight.

pub mod callbacks;
pub mod process;
pub mod queue;
pub mod report;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use callbacks::{CallbackError, KeywordAction, Locator, LocatorStrategy};
pub use process::{InterpreterConfig, ProcessBridge};
pub use queue::{RunSender, RunStream, run_channel};
pub use report::sanitize_report;

/// Extension of the files handed to the interpreter as suites.
pub const SUITE_EXTENSION: &str = ".robot";

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("a run is already in progress ({0})")]
    RunInProgress(Uuid),

    #[error("nothing to run: the bundle contains no files")]
    EmptyBundle,

    #[error("invalid file name in run bundle: {0:?}")]
    InvalidFileName(String),

    #[error("failed to start interpreter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("run was abandoned by its consumer")]
    Cancelled,
}

/// Snapshot of the files of one run: virtual file name to file text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunBundle {
    files: BTreeMap<String, String>,
}

impl RunBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Names of the suite files, in name order.
    pub fn entry_files(&self) -> Vec<&str> {
        self.files
            .keys()
            .map(String::as_str)
            .filter(|name| name.ends_with(SUITE_EXTENSION))
            .collect()
    }

    /// Writes every file below `dir`.
    ///
    /// Names must be relative and may not leave `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<(), ExecutionError> {
        for (name, text) in &self.files {
            let relative = validate_file_name(name)?;
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ExecutionError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, text).map_err(|source| ExecutionError::Io { path, source })?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn validate_file_name(name: &str) -> Result<&Path, ExecutionError> {
    let path = Path::new(name);
    let valid = !name.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(path)
    } else {
        Err(ExecutionError::InvalidFileName(name.to_string()))
    }
}

/// A request from the running suite to act on the preview page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCallback {
    pub keyword: String,
    #[serde(default)]
    pub locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The interpreter ran to completion. `exit_code` is `None` when it was
    /// terminated by a signal.
    Completed { exit_code: Option<i32> },
    /// The run could not be carried out or lost its transport.
    TransportFailed(String),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Completed { exit_code: Some(code) } => format!("Run finished with exit code {}", code),
            Self::Completed { exit_code: None } => "Run terminated by a signal".to_string(),
            Self::TransportFailed(reason) => format!("Run failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeMessage {
    /// Console text to append.
    StdOutput(String),
    /// Full replacement for the results view.
    HtmlReport(String),
    KeywordCallback(KeywordCallback),
    /// Terminal message of every run.
    Finished(RunOutcome),
}

/// Executes bundles.
pub trait ExecutionBridge: Send + Sync {
    /// Starts a run. Failures are reported through the stream's terminal
    /// message, never by panicking or blocking.
    fn start(&self, bundle: RunBundle) -> RunStream;

    fn bridge_name(&self) -> String;
}

/// Consumer of run messages.
#[async_trait]
pub trait RunSink: Send + Sync {
    async fn deliver(&self, run_id: Uuid, message: &BridgeMessage);
}

/// Owns the execution bridge and admits one run at a time.
pub struct RunCoordinator {
    bridge: RwLock<Arc<dyn ExecutionBridge>>,
    active: Arc<Mutex<Option<Uuid>>>,
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("bridge", &self.bridge_name())
            .field("active", &*self.active.lock())
            .finish()
    }
}

impl RunCoordinator {
    pub fn new(bridge: Arc<dyn ExecutionBridge>) -> Self {
        Self {
            bridge: RwLock::new(bridge),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Swaps the bridge used by subsequent runs.
    pub fn replace_bridge(&self, bridge: Arc<dyn ExecutionBridge>) {
        info!("Execution bridge set to {}", bridge.bridge_name());
        *self.bridge.write() = bridge;
    }

    pub fn bridge_name(&self) -> String {
        self.bridge.read().bridge_name()
    }

    /// Identifier of the run in flight, if any.
    pub fn active_run(&self) -> Option<Uuid> {
        *self.active.lock()
    }

    /// Starts a run, or rejects it while another one is outstanding.
    pub fn start(&self, bundle: RunBundle) -> Result<ActiveRun, ExecutionError> {
        if bundle.is_empty() {
            return Err(ExecutionError::EmptyBundle);
        }

        let id = {
            let mut active = self.active.lock();
            if let Some(current) = *active {
                return Err(ExecutionError::RunInProgress(current));
            }
            let id = Uuid::new_v4();
            *active = Some(id);
            id
        };

        let guard = RunGuard {
            slot: Arc::clone(&self.active),
            id,
        };

        let bridge = Arc::clone(&self.bridge.read());
        info!(
            "Starting run {} with {} file(s) on {}",
            id,
            bundle.len(),
            bridge.bridge_name()
        );
        let stream = bridge.start(bundle);

        Ok(ActiveRun {
            id,
            stream,
            _guard: guard,
        })
    }
}

/// Frees the coordinator's run slot on drop.
struct RunGuard {
    slot: Arc<Mutex<Option<Uuid>>>,
    id: Uuid,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if *slot == Some(self.id) {
            *slot = None;
            debug!("Run {} released", self.id);
        }
    }
}

/// A started run. Holds the coordinator's slot until dropped.
pub struct ActiveRun {
    pub id: Uuid,
    stream: RunStream,
    _guard: RunGuard,
}

impl ActiveRun {
    /// Delivers every message to `sink` and returns the outcome.
    pub async fn forward_to<S: RunSink + ?Sized>(mut self, sink: &S) -> RunOutcome {
        while let Some(message) = self.stream.next().await {
            sink.deliver(self.id, &message).await;
            if let BridgeMessage::Finished(outcome) = message {
                debug!("Run {} finished: {}", self.id, outcome.summary());
                return outcome;
            }
        }
        // RunStream always yields a terminal message before ending.
        warn!("Run {} stream ended without a terminal message", self.id);
        RunOutcome::TransportFailed("run stream ended unexpectedly".to_string())
    }

    /// Takes the message stream. The slot stays held until the stream is
    /// dropped.
    pub fn into_stream(self) -> impl futures::Stream<Item = BridgeMessage> {
        let guard = self._guard;
        self.stream.map(move |message| {
            let _held = &guard;
            message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits a fixed message sequence.
    struct ScriptedBridge {
        messages: Vec<BridgeMessage>,
    }

    impl ExecutionBridge for ScriptedBridge {
        fn start(&self, _bundle: RunBundle) -> RunStream {
            let (sender, stream) = run_channel();
            for message in &self.messages {
                match message.clone() {
                    BridgeMessage::StdOutput(text) => {
                        sender.output(text);
                    }
                    BridgeMessage::HtmlReport(html) => {
                        sender.report(html);
                    }
                    BridgeMessage::KeywordCallback(callback) => {
                        sender.keyword_callback(callback);
                    }
                    BridgeMessage::Finished(outcome) => {
                        sender.finish(outcome);
                        return stream;
                    }
                }
            }
            stream
        }

        fn bridge_name(&self) -> String {
            "scripted".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<BridgeMessage>>,
    }

    #[async_trait]
    impl RunSink for RecordingSink {
        async fn deliver(&self, _run_id: Uuid, message: &BridgeMessage) {
            self.messages.lock().push(message.clone());
        }
    }

    fn coordinator(messages: Vec<BridgeMessage>) -> RunCoordinator {
        RunCoordinator::new(Arc::new(ScriptedBridge { messages }))
    }

    fn bundle() -> RunBundle {
        [("test.robot", "*** Test Cases ***\n")].into_iter().collect()
    }

    #[test]
    fn test_entry_files_are_robot_files() {
        let bundle: RunBundle = [("test.robot", ""), ("library.py", ""), ("keywords.resource", "")]
            .into_iter()
            .collect();
        assert_eq!(bundle.entry_files(), vec!["test.robot"]);
    }

    #[test]
    fn test_write_to_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../evil.robot", "/etc/passwd", ""] {
            let bundle: RunBundle = [(name, "x")].into_iter().collect();
            assert!(
                matches!(bundle.write_to(dir.path()), Err(ExecutionError::InvalidFileName(_))),
                "{:?}",
                name
            );
        }
    }

    #[test]
    fn test_write_to_creates_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle: RunBundle = [("resources/common.resource", "*** Keywords ***\n")]
            .into_iter()
            .collect();
        bundle.write_to(dir.path()).unwrap();
        let written = std::fs::read_to_string(dir.path().join("resources/common.resource")).unwrap();
        assert_eq!(written, "*** Keywords ***\n");
    }

    #[tokio::test]
    async fn test_forward_delivers_all_messages_in_order() {
        let messages = vec![
            BridgeMessage::StdOutput("Starting\n".to_string()),
            BridgeMessage::HtmlReport("<html></html>".to_string()),
            BridgeMessage::Finished(RunOutcome::Completed { exit_code: Some(0) }),
        ];
        let coordinator = coordinator(messages.clone());
        let sink = RecordingSink::default();

        let run = coordinator.start(bundle()).unwrap();
        let outcome = run.forward_to(&sink).await;

        assert_eq!(outcome, RunOutcome::Completed { exit_code: Some(0) });
        assert_eq!(*sink.messages.lock(), messages);
        assert_eq!(coordinator.active_run(), None);
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_first_is_outstanding() {
        let coordinator = coordinator(vec![BridgeMessage::Finished(RunOutcome::Completed {
            exit_code: Some(0),
        })]);

        let first = coordinator.start(bundle()).unwrap();
        let rejected = coordinator.start(bundle());
        assert!(matches!(rejected, Err(ExecutionError::RunInProgress(id)) if id == first.id));

        first.forward_to(&RecordingSink::default()).await;
        assert!(coordinator.start(bundle()).is_ok());
    }

    #[test]
    fn test_empty_bundle_is_rejected() {
        let coordinator = coordinator(Vec::new());
        assert!(matches!(coordinator.start(RunBundle::new()), Err(ExecutionError::EmptyBundle)));
        assert_eq!(coordinator.active_run(), None);
    }

    #[tokio::test]
    async fn test_bridge_without_finish_ends_in_transport_failure() {
        let coordinator = coordinator(vec![BridgeMessage::StdOutput("partial".to_string())]);
        let sink = RecordingSink::default();
        let outcome = coordinator.start(bundle()).unwrap().forward_to(&sink).await;
        assert!(matches!(outcome, RunOutcome::TransportFailed(_)));
        assert_eq!(sink.messages.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_into_stream_holds_slot_until_dropped() {
        let coordinator = coordinator(vec![BridgeMessage::Finished(RunOutcome::Completed {
            exit_code: Some(1),
        })]);
        let stream = coordinator.start(bundle()).unwrap().into_stream();
        assert!(coordinator.active_run().is_some());
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 1);
        assert_eq!(coordinator.active_run(), None);
    }

    #[test]
    fn test_outcome_summary() {
        assert_eq!(
            RunOutcome::Completed { exit_code: Some(2) }.summary(),
            "Run finished with exit code 2"
        );
        assert!(!RunOutcome::TransportFailed("gone".into()).is_completed());
    }
}
