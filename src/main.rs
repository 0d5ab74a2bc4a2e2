//! Robot Framework language server
//!
//! Speaks LSP over stdio. Logs go to stderr and a per-session file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::{info, warn};

use robot_language_server::catalog::KeywordCatalog;
use robot_language_server::execution::InterpreterConfig;
use robot_language_server::logging::init_logger;
use robot_language_server::lsp::backend::RobotBackend;

#[derive(Parser, Debug)]
#[command(name = "robot-language-server")]
#[command(about = "Language server for Robot Framework test data")]
#[command(version)]
struct Args {
    /// Directory of libdoc JSON files to add to the keyword catalog (repeatable)
    #[arg(long = "library-dir", value_name = "DIR")]
    library_dirs: Vec<PathBuf>,

    /// Do not load the bundled BuiltIn, Collections and String libraries
    #[arg(long)]
    no_bundled_libraries: bool,

    /// Program used to run suites (default: python3 -m robot ...)
    #[arg(long, value_name = "PROGRAM")]
    interpreter: Option<String>,

    /// Argument passed to the interpreter before the suite files (repeatable)
    #[arg(long = "interpreter-arg", value_name = "ARG", allow_hyphen_values = true)]
    interpreter_args: Vec<String>,

    /// Log level for stderr (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the per-session log file
    #[arg(long)]
    no_file_logging: bool,
}

impl Args {
    fn interpreter(&self) -> InterpreterConfig {
        match &self.interpreter {
            Some(program) => InterpreterConfig::new(program.clone(), self.interpreter_args.clone()),
            None => InterpreterConfig::default(),
        }
    }
}

/// Builds the keyword catalog. Load failures are logged and never stop the
/// server; header completion works without any library.
fn load_catalog(args: &Args) -> KeywordCatalog {
    let mut catalog = if args.no_bundled_libraries {
        KeywordCatalog::new()
    } else {
        KeywordCatalog::bundled()
    };

    let failures = catalog.load_dirs(&args.library_dirs);
    if !failures.is_empty() {
        warn!("{} library source(s) could not be loaded", failures.len());
    }

    if catalog.is_empty() {
        warn!("The keyword catalog is empty; only section headers will be completed");
    }
    catalog
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _log_guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("Failed to initialize logging")?;

    info!("robot-language-server v{}", env!("CARGO_PKG_VERSION"));
    if args.interpreter.is_none() && !args.interpreter_args.is_empty() {
        warn!("--interpreter-arg has no effect without --interpreter");
    }

    let catalog = Arc::new(load_catalog(&args));
    let interpreter = args.interpreter();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| RobotBackend::new(client, Arc::clone(&catalog), interpreter.clone()));

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server stopped");
    Ok(())
}
