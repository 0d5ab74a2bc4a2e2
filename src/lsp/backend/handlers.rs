//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` trait implementation
//! for the Robot Framework backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Completion
//! - The `robot.run` command

use std::sync::Arc;

use serde_json::{Value, json};
use tower_lsp::jsonrpc::{self, Result as LspResult};
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializeParams, InitializeResult, InitializedParams, MessageType,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp::LanguageServer;
use tracing::{debug, error, info, warn};

use super::RUN_COMMAND;
use super::run::ClientRunSink;
use super::state::RobotBackend;
use crate::execution::{ExecutionError, RunBundle};
use crate::lsp::features::completion::{build_suggestions, to_completion_items};
use crate::lsp::models::LspDocument;
use crate::parsers::position_utils::CursorPosition;
use crate::parsers::robot::split_lines;

#[tower_lsp::async_trait]
impl LanguageServer for RobotBackend {
    /// Handles the LSP initialize request, applying client options and
    /// announcing capabilities.
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("Received initialize: {:?}", params.client_info);

        let interpreter_option = params
            .initialization_options
            .as_ref()
            .and_then(|options| options.get("interpreter"))
            .and_then(Value::as_str);
        if let Some(interpreter) = interpreter_option {
            info!("Client requested interpreter: {}", interpreter);
        }
        self.apply_interpreter_option(interpreter_option);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: None,
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![RUN_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification.
    async fn initialized(&self, params: InitializedParams) {
        info!("Initialized: {:?}", params);
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> LspResult<()> {
        info!("Received shutdown request");
        if let Some(run_id) = self.runner.active_run() {
            warn!("Shutting down while run {} is in progress", run_id);
        }
        Ok(())
    }

    /// Handles opening a text document.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!(
            "Opening document: URI={}, version={}",
            params.text_document.uri, params.text_document.version
        );
        let uri = params.text_document.uri;
        let document_id = self.next_document_id();
        let document = Arc::new(LspDocument::new(
            document_id,
            &params.text_document.text,
            params.text_document.version,
        ));
        debug!("Document {} has {} lines", uri, document.num_lines().await);

        if self.documents_by_uri.insert(uri.clone(), document).is_some() {
            warn!("Document {} was already open; replaced", uri);
        }
    }

    /// Handles changes to a text document, applying incremental updates.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("textDocument/didChange: {}", params.text_document.uri);
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // DashMap::get returns a guard that dereferences to the value
        let Some(document) = self.documents_by_uri.get(&uri).map(|r| r.value().clone()) else {
            warn!("Failed to find document with URI={}", uri);
            return;
        };

        if let Err(e) = document.apply(params.content_changes, version).await {
            warn!("Failed to apply changes to document with URI={}: {}", uri, e);
        }
    }

    /// Handles closing a text document, removing it from state.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        info!("textDocument/didClose: {}", params.text_document.uri);
        let uri = params.text_document.uri;
        // DashMap::remove returns Option<(K, V)>
        match self.documents_by_uri.remove(&uri) {
            Some((_key, document)) => info!("Closed document: {}, id: {}", uri, document.id),
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        debug!("Completion request at {}:{:?}", uri, position);

        let Some(document) = self.documents_by_uri.get(&uri).map(|r| r.value().clone()) else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };

        let text = document.text().await;
        let lines = split_lines(&text);
        let line = lines.get(position.line as usize).copied().unwrap_or_default();
        let cursor = CursorPosition::from_lsp(position, line);
        let suggestions = build_suggestions(&lines, cursor, &self.catalog);
        debug!("Returning {} completion items", suggestions.len());

        Ok(Some(CompletionResponse::Array(to_completion_items(suggestions, cursor, line))))
    }

    /// Handles `robot.run`.
    ///
    /// The optional argument is an object mapping file names to text. Without
    /// it every open document is run. Returns `{ "runId": ... }` once the run
    /// has started; its output arrives as notifications.
    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        info!("workspace/executeCommand: {}", params.command);
        if params.command != RUN_COMMAND {
            return Err(jsonrpc::Error::invalid_params(format!(
                "Unknown command: {}",
                params.command
            )));
        }

        let bundle = match params.arguments.into_iter().next() {
            Some(argument) => serde_json::from_value::<RunBundle>(argument)
                .map_err(|e| jsonrpc::Error::invalid_params(format!("Invalid run bundle: {}", e)))?,
            None => self.snapshot_open_documents().await,
        };

        let run = match self.runner.start(bundle) {
            Ok(run) => run,
            Err(e) => {
                if matches!(e, ExecutionError::RunInProgress(_)) {
                    self.client.show_message(MessageType::WARNING, e.to_string()).await;
                }
                return Err(jsonrpc::Error::invalid_params(e.to_string()));
            }
        };

        let run_id = run.id;
        let sink = ClientRunSink::new(self.client.clone());
        tokio::spawn(async move {
            let outcome = run.forward_to(&sink).await;
            if outcome.is_completed() {
                info!("Run {}: {}", run_id, outcome.summary());
            } else {
                error!("Run {}: {}", run_id, outcome.summary());
            }
        });

        Ok(Some(json!({ "runId": run_id.to_string() })))
    }
}
