use ropey::Rope;

/// State for an open text document managed by the LSP server.
#[derive(Debug)]
pub struct LspDocumentState {
    pub text: Rope,
    pub version: i32,
}

/// LSP document with state for open files.
///
/// The editor instance is owned by the server between `didOpen` and
/// `didClose`; completion reads its text snapshot on every request.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}
