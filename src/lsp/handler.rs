use crate::cli::output::Printer;
use crate::lsp::protocol::{InboundMessage, PublishDiagnosticsParams, METHOD_DOCUMENT_HIGHLIGHT};

/// Receives every request or notification the server pushes to us.
///
/// Called from the connection's read loop, so implementations must not block.
pub trait InboundHandler: Send + Sync + 'static {
    fn handle(&self, message: &InboundMessage);
}

/// Decode the params of a `textDocument/documentHighlight` notification.
///
/// Returns `None` for anything else, and for bodies that do not decode.
pub fn decode_highlight_diagnostics(message: &InboundMessage) -> Option<PublishDiagnosticsParams> {
    if !message.is_notification() || message.method != METHOD_DOCUMENT_HIGHLIGHT {
        return None;
    }
    serde_json::from_value(message.params.clone()?).ok()
}

/// Prints each inbound message and checks that highlight diagnostics decode.
///
/// Requests from the server are printed but never answered.
pub struct PrintingHandler {
    printer: Printer,
}

impl PrintingHandler {
    pub fn new(printer: Printer) -> Self {
        Self { printer }
    }
}

impl InboundHandler for PrintingHandler {
    fn handle(&self, message: &InboundMessage) {
        self.printer.inbound(message);

        if !message.is_notification() {
            tracing::debug!("Not replying to server request {}", message.method);
            return;
        }

        if let Some(params) = decode_highlight_diagnostics(message) {
            tracing::debug!(
                "Decoded {} diagnostic(s) for {}",
                params.diagnostics.len(),
                params.uri
            );
        }
    }
}
