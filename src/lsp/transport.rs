use std::sync::Arc;

use tokio::net::TcpStream;

use crate::lsp::connection::Connection;
use crate::lsp::handler::InboundHandler;
use crate::utils::error::{ProbeError, ProbeResult};

/// Where the language server is listening.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Dial the endpoint once. There is no retry.
    pub async fn connect(&self, handler: Arc<dyn InboundHandler>) -> ProbeResult<Connection> {
        let address = self.address();
        tracing::debug!("Connecting to LSP server at {address}");

        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| ProbeError::transport(format!("connecting to {address}"), e))?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY: {e}");
        }

        tracing::debug!("Connected to {address}");
        let (reader, writer) = stream.into_split();
        Ok(Connection::new(reader, writer, handler))
    }
}
