use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::cli::args::Cli;
use crate::cli::output::Printer;
use crate::listener::Listener;
use crate::lsp::connection::Connection;
use crate::lsp::handler::PrintingHandler;
use crate::lsp::protocol::{
    DidChangeTextDocumentParams, HandshakeRequest, HandshakeResponse, InitializeParams,
    METHOD_DID_CHANGE, METHOD_HANDSHAKE, METHOD_INITIALIZE,
};
use crate::lsp::transport::Endpoint;

pub struct SessionConfig {
    pub endpoint: Endpoint,
    pub root: PathBuf,
    pub settle: Duration,
    pub poll_interval: Duration,
    pub call_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
        // Absolute but not canonical: symlinks in the path are kept as given.
        let root = std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve workspace root: {}", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Failed to resolve workspace root: {} is not a directory", root.display());
        }

        Ok(Self {
            endpoint: Endpoint::new(cli.host.clone(), cli.port),
            root,
            settle: cli.settle(),
            poll_interval: cli.poll_interval(),
            call_timeout: cli.call_timeout(),
        })
    }
}

/// `file://` URI for an absolute workspace root.
pub fn root_uri(root: &Path) -> Result<String> {
    Url::from_file_path(root)
        .map(String::from)
        .map_err(|()| anyhow::anyhow!("Cannot express {} as a file URI", root.display()))
}

/// Run the fixed sequence: initialize, handshake, didChange.
pub async fn run(config: &SessionConfig, printer: Printer) -> Result<()> {
    let root_path = config.root.to_string_lossy().into_owned();
    let root_uri = root_uri(&config.root)?;

    let handler = Arc::new(PrintingHandler::new(printer));
    let connection = config.endpoint.connect(handler).await?.with_call_timeout(config.call_timeout);

    let init_result = initialize(&connection, root_path, root_uri).await?;
    printer.result("initialize result:", &init_result);
    printer.status("initialize done, sending handshake...");

    tokio::time::sleep(config.settle).await;

    // A `null` result is a successful handshake with nothing to report.
    let handshake: Option<HandshakeResponse> =
        connection.call(METHOD_HANDSHAKE, &HandshakeRequest::default()).await?;
    printer.serialized("handshake result:", &handshake.unwrap_or_default());

    let listener = Listener::spawn(config.poll_interval, printer);

    tokio::time::sleep(config.settle).await;

    let change_result: Value =
        connection.call(METHOD_DID_CHANGE, &DidChangeTextDocumentParams::placeholder()).await?;
    printer.result("didChange result:", &change_result);

    let wakeups = listener.cancel().await;
    tracing::debug!("Listener stopped after {wakeups} wakeup(s)");
    printer.status("cancel done, exiting");

    Ok(())
}

async fn initialize(connection: &Connection, root_path: String, root_uri: String) -> Result<Value> {
    tracing::debug!("Sending LSP initialize request for {root_uri}");
    let params = InitializeParams::new(root_path, root_uri);
    Ok(connection.call(METHOD_INITIALIZE, &params).await?)
}
