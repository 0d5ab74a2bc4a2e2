/// Integration tests for the LSP backend
///
/// Drives the `LanguageServer` implementation in-process:
/// - Document lifecycle and completion on the edited text
/// - UTF-16 columns and an empty keyword catalog
/// - The `robot.run` command and its single-run policy

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionParams, CompletionResponse, CompletionTextEdit, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandParams,
    InitializeParams, InsertTextFormat, Position, Range, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, Url,
    VersionedTextDocumentIdentifier,
};
use tower_lsp::{LanguageServer, LspService};

use robot_language_server::catalog::KeywordCatalog;
use robot_language_server::execution::{
    ExecutionBridge, InterpreterConfig, RunBundle, RunSender, RunStream, run_channel,
};
use robot_language_server::lsp::backend::{RUN_COMMAND, RobotBackend};

/// Records bundles and keeps every run open until dropped.
#[derive(Default)]
struct HoldingBridge {
    bundles: Mutex<Vec<RunBundle>>,
    senders: Mutex<Vec<RunSender>>,
}

impl ExecutionBridge for HoldingBridge {
    fn start(&self, bundle: RunBundle) -> RunStream {
        let (sender, stream) = run_channel();
        sender.output("Starting..\n");
        self.bundles.lock().push(bundle);
        self.senders.lock().push(sender);
        stream
    }

    fn bridge_name(&self) -> String {
        "holding".to_string()
    }
}

fn service(bridge: Arc<HoldingBridge>) -> (LspService<RobotBackend>, tower_lsp::ClientSocket) {
    service_with_catalog(KeywordCatalog::bundled(), bridge)
}

fn service_with_catalog(
    catalog: KeywordCatalog,
    bridge: Arc<HoldingBridge>,
) -> (LspService<RobotBackend>, tower_lsp::ClientSocket) {
    let catalog = Arc::new(catalog);
    LspService::new(move |client| {
        RobotBackend::with_bridge(client, catalog, InterpreterConfig::default(), bridge)
    })
}

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///suites/{}", name)).unwrap()
}

async fn open(backend: &RobotBackend, name: &str, text: &str) {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(uri(name), "robotframework".to_string(), 1, text.to_string()),
        })
        .await;
}

fn completion_params(name: &str, line: u32, character: u32) -> CompletionParams {
    CompletionParams {
        text_document_position: TextDocumentPositionParams::new(
            TextDocumentIdentifier::new(uri(name)),
            Position::new(line, character),
        ),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        context: None,
    }
}

fn run_params(arguments: Vec<serde_json::Value>) -> ExecuteCommandParams {
    ExecuteCommandParams {
        command: RUN_COMMAND.to_string(),
        arguments,
        work_done_progress_params: Default::default(),
    }
}

#[tokio::test]
async fn test_initialize_announces_completion_and_run_command() {
    let (service, _socket) = service(Arc::new(HoldingBridge::default()));
    let result = service.inner().initialize(InitializeParams::default()).await.unwrap();

    assert!(result.capabilities.completion_provider.is_some());
    let commands = result.capabilities.execute_command_provider.unwrap().commands;
    assert_eq!(commands, vec![RUN_COMMAND.to_string()]);
}

#[tokio::test]
async fn test_completion_follows_document_edits() {
    let (service, _socket) = service(Arc::new(HoldingBridge::default()));
    let backend = service.inner();
    open(backend, "demo.robot", "*** Test Cases ***\nDemo\n").await;

    // Type a step row on the empty third line.
    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(uri("demo.robot"), 2),
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(2, 0), Position::new(2, 0))),
                range_length: None,
                text: "    Lo".to_string(),
            }],
        })
        .await;

    let response = backend
        .completion(completion_params("demo.robot", 2, 6))
        .await
        .unwrap();
    let Some(CompletionResponse::Array(items)) = response else {
        panic!("expected completion items, got {:?}", response);
    };

    let log = items.iter().find(|item| item.label == "Log").expect("Log item");
    assert_eq!(log.insert_text_format, Some(InsertTextFormat::SNIPPET));
    match &log.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => {
            assert_eq!(edit.range, Range::new(Position::new(2, 4), Position::new(2, 6)));
            assert_eq!(edit.new_text, "Log    ${1:message}");
        }
        other => panic!("unexpected edit {:?}", other),
    }
}

async fn completion_items(backend: &RobotBackend, name: &str, line: u32, character: u32) -> Vec<CompletionItem> {
    match backend.completion(completion_params(name, line, character)).await.unwrap() {
        Some(CompletionResponse::Array(items)) => items,
        other => panic!("expected completion items, got {:?}", other),
    }
}

fn edit_range(item: &CompletionItem) -> Range {
    match &item.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => edit.range,
        other => panic!("unexpected edit {:?}", other),
    }
}

#[tokio::test]
async fn test_completion_columns_are_utf16_units() {
    let (service, _socket) = service(Arc::new(HoldingBridge::default()));
    let backend = service.inner();
    // U+1D11E occupies two UTF-16 code units, so the line end is at character 8.
    open(backend, "clef.robot", "*** Test Cases ***\nClef\n    \u{1D11E}Lo").await;

    let items = completion_items(backend, "clef.robot", 2, 8).await;
    let log = items.iter().find(|item| item.label == "Log").expect("Log item");
    assert_eq!(edit_range(log), Range::new(Position::new(2, 4), Position::new(2, 8)));
}

#[tokio::test]
async fn test_empty_catalog_still_completes_headers() {
    let (service, _socket) =
        service_with_catalog(KeywordCatalog::new(), Arc::new(HoldingBridge::default()));
    let backend = service.inner();
    open(backend, "empty.robot", "*** Settings ***\n\n*** Test Cases ***\nT\n    ").await;

    let headers = completion_items(backend, "empty.robot", 1, 0).await;
    let labels: Vec<_> = headers.iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, vec!["*** Keywords ***", "*** Comment ***", "*** Variables ***"]);

    assert!(completion_items(backend, "empty.robot", 4, 4).await.is_empty());
}

#[tokio::test]
async fn test_completion_for_unknown_document_is_empty() {
    let (service, _socket) = service(Arc::new(HoldingBridge::default()));
    let response = service
        .inner()
        .completion(completion_params("missing.robot", 0, 0))
        .await
        .unwrap();
    assert!(response.is_none());
}

#[tokio::test]
async fn test_run_snapshots_open_documents() {
    let bridge = Arc::new(HoldingBridge::default());
    let (service, _socket) = service(Arc::clone(&bridge));
    let backend = service.inner();
    open(backend, "test.robot", "*** Test Cases ***\n").await;
    open(backend, "lib.py", "def helper(): pass\n").await;
    open(backend, "closed.robot", "").await;
    backend
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier::new(uri("closed.robot")),
        })
        .await;

    let result = backend.execute_command(run_params(Vec::new())).await.unwrap();
    assert!(result.and_then(|value| value.get("runId").cloned()).is_some());

    let bundles = bridge.bundles.lock();
    let names: Vec<_> = bundles[0].files().keys().cloned().collect();
    assert_eq!(names, vec!["lib.py", "test.robot"]);
}

#[tokio::test]
async fn test_second_run_is_rejected_while_first_is_open() {
    let bridge = Arc::new(HoldingBridge::default());
    let (service, _socket) = service(Arc::clone(&bridge));
    let backend = service.inner();

    let files = json!({ "test.robot": "*** Test Cases ***\nT\n    No Operation\n" });
    backend.execute_command(run_params(vec![files.clone()])).await.unwrap();
    let second = backend.execute_command(run_params(vec![files])).await;

    assert!(second.is_err());
    assert_eq!(bridge.bundles.lock().len(), 1);
    assert_eq!(bridge.bundles.lock()[0].entry_files(), vec!["test.robot"]);
}

#[tokio::test]
async fn test_malformed_run_argument_is_rejected() {
    let (service, _socket) = service(Arc::new(HoldingBridge::default()));
    let result = service
        .inner()
        .execute_command(run_params(vec![json!(["not", "a", "map"])]))
        .await;
    assert!(result.is_err());
}
