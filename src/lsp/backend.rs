use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

use crate::catalog::KeywordCatalog;
use crate::execution::{ExecutionBridge, InterpreterConfig, ProcessBridge, RunBundle, RunCoordinator};
use crate::lsp::models::LspDocument;

mod handlers;
mod run;
mod state;

pub use run::ClientRunSink;
pub use state::RobotBackend;

/// Command that runs the open suites.
pub const RUN_COMMAND: &str = "robot.run";

impl RobotBackend {
    /// Creates a backend that runs suites with `interpreter`, unless the
    /// ROBOT_LS_INTERPRETER environment variable names another one.
    pub fn new(client: Client, catalog: Arc<KeywordCatalog>, interpreter: InterpreterConfig) -> Self {
        let effective = InterpreterConfig::from_env_or(None, interpreter.clone());
        info!("Running suites with: {}", effective);
        let bridge: Arc<dyn ExecutionBridge> = Arc::new(ProcessBridge::new(effective));
        Self::with_bridge(client, catalog, interpreter, bridge)
    }

    /// Creates a backend with an explicit execution bridge.
    pub fn with_bridge(
        client: Client,
        catalog: Arc<KeywordCatalog>,
        interpreter: InterpreterConfig,
        bridge: Arc<dyn ExecutionBridge>,
    ) -> Self {
        info!(
            "Keyword catalog holds {} libraries: {:?}",
            catalog.len(),
            catalog.library_names()
        );
        Self {
            client,
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            catalog,
            runner: Arc::new(RunCoordinator::new(bridge)),
            interpreter,
        }
    }

    /// Generates the next unique document ID.
    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Applies the `interpreter` initialization option, if present.
    fn apply_interpreter_option(&self, init_option: Option<&str>) {
        if init_option.is_none() {
            return;
        }
        let interpreter = InterpreterConfig::from_env_or(init_option, self.interpreter.clone());
        self.runner.replace_bridge(Arc::new(ProcessBridge::new(interpreter)));
    }

    /// Snapshots every open document under its file name.
    pub async fn snapshot_open_documents(&self) -> RunBundle {
        // Clone the handles first so no map guard is held across an await.
        let documents: Vec<(Url, Arc<LspDocument>)> = self
            .documents_by_uri
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut bundle = RunBundle::new();
        for (uri, document) in documents {
            let name = file_name(&uri).unwrap_or_else(|| format!("document-{}.robot", document.id));
            if bundle.files().contains_key(&name) {
                warn!("Several open documents are named {}; keeping {}", name, uri);
            }
            bundle.insert(name, document.text().await);
        }
        debug!("Snapshot of {} open document(s)", bundle.len());
        bundle
    }
}

/// Last path segment of `uri`.
fn file_name(uri: &Url) -> Option<String> {
    uri.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
