use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use dana_language_server::backend::DanaBackend;
use dana_language_server::logging::init_logger;

/// Language server for the Dana programming language.
#[derive(Debug, Parser)]
#[command(name = "dana-language-server", version, about)]
struct Args {
    /// Communicate over stdin/stdout (the only supported transport)
    #[arg(long)]
    stdio: bool,

    /// Process ID of the client that launched the server
    #[arg(long)]
    client_process_id: Option<u32>,

    /// Override the stderr log level (otherwise RUST_LOG, then "info")
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the DEBUG-level session log file
    #[arg(long)]
    no_file_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The guard must stay alive until exit so buffered file output is flushed
    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;

    info!(
        "Starting dana-language-server v{} (pid {})",
        env!("CARGO_PKG_VERSION"),
        std::process::id()
    );
    if !args.stdio {
        // The flag exists for launcher compatibility; stdio is all we speak
        info!("No transport flag given, defaulting to stdio");
    }

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| DanaBackend::new(client, args.client_process_id));

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server exited");
    Ok(())
}
