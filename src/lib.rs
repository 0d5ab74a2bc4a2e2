pub mod catalog;
pub mod execution;
pub mod logging;
pub mod lsp;
pub mod parsers;
