use std::time::Duration;

use thiserror::Error;

use crate::lsp::protocol::ResponseError;

/// Everything that can go wrong while exercising a server.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("transport error while {operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("remote call {method} failed: {failure}")]
    RemoteCall { method: String, failure: CallFailure },

    #[error("failed to decode {method} payload: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single call did not produce a result.
#[derive(Error, Debug)]
pub enum CallFailure {
    #[error("server returned error {}: {}", .0.code, .0.message)]
    Rejected(ResponseError),

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

impl ProbeError {
    pub fn transport(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport { operation: operation.into(), source }
    }

    pub fn remote_call(method: impl Into<String>, failure: CallFailure) -> Self {
        Self::RemoteCall { method: method.into(), failure }
    }

    pub fn decode(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode { method: method.into(), source }
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
