use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_HANDSHAKE: &str = "gopls/handshake";
pub const METHOD_DID_CHANGE: &str = "textDocument/didChange";
/// Inbound notification whose params are decoded as publish-diagnostics.
pub const METHOD_DOCUMENT_HIGHLIGHT: &str = "textDocument/documentHighlight";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VersionedTextDocumentIdentifier {
    #[serde(flatten)]
    pub text_document: TextDocumentIdentifier,
    pub version: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub process_id: Option<u32>,
    pub root_path: String,
    pub root_uri: String,
    pub capabilities: Value,
}

impl InitializeParams {
    pub fn new(root_path: String, root_uri: String) -> Self {
        Self {
            process_id: Some(std::process::id()),
            root_path,
            root_uri,
            capabilities: Value::Object(serde_json::Map::new()),
        }
    }
}

/// Vendor handshake request. Always sent as `{}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct HandshakeRequest {}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct HandshakeResponse {
    #[serde(rename = "sessionID", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub logfile: Option<String>,
    #[serde(rename = "debugAddr", default)]
    pub debug_addr: Option<String>,
    #[serde(rename = "goVersion", default)]
    pub go_version: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentContentChangeEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeTextDocumentParams {
    pub text_document: VersionedTextDocumentIdentifier,
    pub content_changes: Vec<TextDocumentContentChangeEvent>,
}

impl DidChangeTextDocumentParams {
    /// Placeholder change: a fixed document identifier and no edits.
    pub fn placeholder() -> Self {
        Self {
            text_document: VersionedTextDocumentIdentifier {
                text_document: TextDocumentIdentifier { uri: "dammyURI".to_string() },
                version: 2,
            },
            content_changes: Vec::new(),
        }
    }
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiagnosticRelatedInformation {
    pub location: Location,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosticSeverity>,
    /// Either a number or a string on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_information: Option<Vec<DiagnosticRelatedInformation>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublishDiagnosticsParams {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize, Deserialize)]
pub struct LSPRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    pub params: Value,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LSPResponse {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A message pushed by the server that was not a reply to one of our calls.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Present for requests, absent for notifications.
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
    /// The frame exactly as it was decoded.
    pub raw: Value,
}

impl InboundMessage {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Classification of a decoded frame.
#[derive(Debug)]
pub enum Incoming {
    Response { id: u64, response: LSPResponse },
    Inbound(InboundMessage),
}

/// Sort a raw frame into a response or an inbound message.
///
/// Returns `None` for frames that are neither (or responses with non-numeric ids,
/// which we never issue).
pub fn classify(frame: Value) -> Option<Incoming> {
    let method = frame.get("method").and_then(Value::as_str).map(String::from);
    let id = frame.get("id").filter(|id| !id.is_null()).cloned();

    if let Some(method) = method {
        return Some(Incoming::Inbound(InboundMessage {
            id,
            method,
            params: frame.get("params").cloned(),
            raw: frame,
        }));
    }

    let id = id?.as_u64()?;
    let response: LSPResponse = serde_json::from_value(frame).ok()?;
    Some(Incoming::Response { id, response })
}
