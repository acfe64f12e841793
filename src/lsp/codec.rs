//! `Content-Length` framing for JSON-RPC messages.
//!
//! Every message on the wire is a header block terminated by an empty line,
//! followed by exactly `Content-Length` bytes of JSON:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}
//! ```

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::utils::error::{ProbeError, ProbeResult};

/// Upper bound on a single frame body (4 MiB).
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

fn invalid_data(operation: &str, message: String) -> ProbeError {
    ProbeError::transport(operation, io::Error::new(io::ErrorKind::InvalidData, message))
}

pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: BufReader::new(reader) }
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream cleanly.
    pub async fn read_frame(&mut self) -> ProbeResult<Option<Value>> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            return Err(invalid_data(
                "reading frame",
                format!("Content-Length {content_length} exceeds maximum {MAX_FRAME_BYTES}"),
            ));
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .await
            .map_err(|e| ProbeError::transport("reading frame body", e))?;

        let value = serde_json::from_slice(&body).map_err(|e| ProbeError::decode("frame", e))?;
        Ok(Some(value))
    }

    async fn read_headers(&mut self) -> ProbeResult<Option<usize>> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| ProbeError::transport("reading frame header", e))?;

            if bytes_read == 0 {
                if saw_header_bytes {
                    return Err(invalid_data(
                        "reading frame header",
                        "unexpected EOF inside header block".to_string(),
                    ));
                }
                return Ok(None);
            }
            saw_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                if key.trim().eq_ignore_ascii_case("Content-Length") {
                    let len = value.trim().parse::<usize>().map_err(|e| {
                        invalid_data("reading frame header", format!("bad Content-Length: {e}"))
                    })?;
                    content_length = Some(len);
                }
            }
        }

        content_length
            .map(Some)
            .ok_or_else(|| invalid_data("reading frame header", "missing Content-Length".into()))
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, content: &str) -> ProbeResult<()> {
        let message = format!("Content-Length: {}\r\n\r\n{content}", content.len());
        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(|e| ProbeError::transport("writing frame", e))?;
        self.writer.flush().await.map_err(|e| ProbeError::transport("flushing frame", e))?;
        Ok(())
    }
}
