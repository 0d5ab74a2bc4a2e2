//! Backend state management
//!
//! This module defines the RobotBackend struct, which holds the open
//! documents, the shared keyword catalog and the run coordinator.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::catalog::KeywordCatalog;
use crate::execution::{InterpreterConfig, RunCoordinator};
use crate::lsp::models::LspDocument;

/// The Robot Framework language server backend.
#[derive(Clone)]
pub struct RobotBackend {
    pub(super) client: Client,
    /// Open documents, from `didOpen` until `didClose`.
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    /// Read-only after startup.
    pub(super) catalog: Arc<KeywordCatalog>,
    pub(super) runner: Arc<RunCoordinator>,
    /// Interpreter used when neither the environment nor the client picks one.
    pub(super) interpreter: InterpreterConfig,
}

// Manual Debug implementation summarizing the shared state
impl std::fmt::Debug for RobotBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotBackend")
            .field("documents_count", &self.documents_by_uri.len())
            .field("libraries", &self.catalog.library_names())
            .field("runner", &self.runner)
            .finish()
    }
}
