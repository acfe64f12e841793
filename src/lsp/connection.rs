use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::lsp::codec::{FrameReader, FrameWriter};
use crate::lsp::handler::InboundHandler;
use crate::lsp::protocol::{classify, Incoming, LSPRequest, LSPResponse};
use crate::utils::error::{CallFailure, ProbeError, ProbeResult};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Default)]
struct PendingCalls {
    /// Set once the read loop has exited; no response can arrive after that.
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<LSPResponse>>,
}

#[derive(Clone, Default)]
struct Pending(Arc<Mutex<PendingCalls>>);

impl Pending {
    fn lock(&self) -> MutexGuard<'_, PendingCalls> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: u64) -> Option<oneshot::Receiver<LSPResponse>> {
        let mut pending = self.lock();
        if pending.closed {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        pending.waiters.insert(id, tx);
        Some(rx)
    }

    fn forget(&self, id: u64) {
        self.lock().waiters.remove(&id);
    }

    fn resolve(&self, id: u64, response: LSPResponse) {
        let sender = self.lock().waiters.remove(&id);
        match sender {
            Some(sender) => {
                let _ = sender.send(response);
            }
            None => tracing::warn!("Dropping response for unknown request id {id}"),
        }
    }

    /// Fail every outstanding call by dropping its sender.
    fn close(&self) {
        let mut pending = self.lock();
        pending.closed = true;
        pending.waiters.clear();
    }
}

/// A JSON-RPC connection to a language server.
///
/// The connection owns both halves of the stream. Calls may be issued
/// concurrently from any task; responses are routed back by id, while
/// server-initiated messages go to the [`InboundHandler`].
pub struct Connection {
    writer: tokio::sync::Mutex<FrameWriter<BoxedWriter>>,
    request_id: AtomicU64,
    pending: Pending,
    call_timeout: Option<Duration>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    pub fn new<R, W>(reader: R, writer: W, handler: Arc<dyn InboundHandler>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending = Pending::default();
        let reader_task = Self::start_read_loop(reader, pending.clone(), handler);
        let writer: BoxedWriter = Box::new(writer);

        Self {
            writer: tokio::sync::Mutex::new(FrameWriter::new(writer)),
            request_id: AtomicU64::new(1),
            pending,
            call_timeout: None,
            reader_task,
        }
    }

    /// Give up on calls that get no response within `timeout`.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Issue a request and decode its result into `T`.
    pub async fn call<P, T>(&self, method: &str, params: &P) -> ProbeResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(|e| ProbeError::decode(method, e))?;
        let result = self.call_raw(method, params).await?;
        serde_json::from_value(result).map_err(|e| ProbeError::decode(method, e))
    }

    /// Issue a request and return its raw result (`null` when absent).
    pub async fn call_raw(&self, method: &str, params: Value) -> ProbeResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let rx = self
            .pending
            .register(id)
            .ok_or_else(|| ProbeError::remote_call(method, CallFailure::ConnectionClosed))?;

        let request = LSPRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::Number(id.into()),
            method: method.to_string(),
            params,
        };

        tracing::debug!("Sending LSP request: {method} (id: {id})");
        if let Err(e) = self.send_message(method, &request).await {
            self.pending.forget(id);
            return Err(e);
        }

        let received = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.pending.forget(id);
                    return Err(ProbeError::remote_call(method, CallFailure::TimedOut(limit)));
                }
            },
            None => rx.await,
        };

        let response = received
            .map_err(|_| ProbeError::remote_call(method, CallFailure::ConnectionClosed))?;

        if let Some(error) = response.error {
            tracing::debug!("LSP error response for {method} (id: {id}): {error:?}");
            return Err(ProbeError::remote_call(method, CallFailure::Rejected(error)));
        }

        tracing::debug!("LSP response received for {method} (id: {id})");
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn send_message<T: Serialize + Sync>(&self, method: &str, message: &T) -> ProbeResult<()> {
        let content = serde_json::to_string(message).map_err(|e| ProbeError::decode(method, e))?;
        let mut writer = self.writer.lock().await;
        writer.write_frame(&content).await
    }

    fn start_read_loop<R>(
        reader: R,
        pending: Pending,
        handler: Arc<dyn InboundHandler>,
    ) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut reader = FrameReader::new(reader);

            loop {
                match reader.read_frame().await {
                    Ok(Some(frame)) => match classify(frame) {
                        Some(Incoming::Response { id, response }) => pending.resolve(id, response),
                        Some(Incoming::Inbound(message)) => {
                            tracing::debug!("Inbound LSP message: {}", message.method);
                            handler.handle(&message);
                        }
                        None => tracing::warn!("Ignoring frame that is neither response nor message"),
                    },
                    Ok(None) => {
                        tracing::debug!("LSP server closed the connection (EOF)");
                        break;
                    }
                    // The body was consumed in full, so the stream is still aligned.
                    Err(e @ ProbeError::Decode { .. }) => {
                        tracing::warn!("Skipping undecodable frame: {e}");
                    }
                    Err(e) => {
                        tracing::debug!("LSP connection read error: {e}");
                        break;
                    }
                }
            }

            pending.close();
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
