//! Streamed query response decoding.
//!
//! The transport delivers a query response as an ordered sequence of binary
//! chunks, each tagged with the logical section it belongs to (rows, errors,
//! signature, metrics), plus end-of-section markers and one terminal status
//! marker. [`QueryDecoder`] is the transport-facing half: it decodes each
//! payload through a [`ChunkCodec`] and routes it to the matching section
//! channel. [`StreamedQueryResult`] is the caller-facing half: one lazy
//! stream per section, each independently consumable, plus a deferred final
//! status that resolves only once the terminal marker has been observed.
//!
//! Sections may arrive interleaved or out of order; because every section
//! has its own channel there is no global cursor to get stuck behind.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec::ChunkCodec;
use crate::error::{Error, Result};

/// Logical part of a streamed query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Rows,
    Errors,
    Signature,
    Metrics,
}

/// One chunk's worth of payload bytes, plus an optional release hook for
/// pooled buffers. The hook runs exactly once when the buffer is dropped,
/// which the decoder does right after decoding, whether or not the decode
/// succeeded.
pub struct ChunkBuffer {
    bytes: Vec<u8>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ChunkBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            release: None,
        }
    }

    /// A buffer whose `release` hook returns it to the transport's pool.
    pub fn with_release(bytes: impl Into<Vec<u8>>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            bytes: bytes.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for ChunkBuffer {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ChunkBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkBuffer")
            .field("len", &self.bytes.len())
            .field("pooled", &self.release.is_some())
            .finish()
    }
}

/// Input to the decoder, as delivered by the transport callback.
#[derive(Debug)]
pub enum QueryChunk {
    /// A self-contained payload for one section.
    Payload {
        section: Section,
        buffer: ChunkBuffer,
    },
    /// No more payloads will arrive for this section.
    SectionEnd(Section),
    /// Terminal status marker; always the last chunk of a response.
    Status { success: bool },
}

type SectionSender = mpsc::UnboundedSender<Result<Value>>;

struct Shared {
    rows: Option<SectionSender>,
    errors: Option<SectionSender>,
    signature: Option<SectionSender>,
    metrics: Option<SectionSender>,
    status: Option<oneshot::Sender<Result<bool>>>,
    completed: bool,
}

impl Shared {
    fn sender_mut(&mut self, section: Section) -> &mut Option<SectionSender> {
        match section {
            Section::Rows => &mut self.rows,
            Section::Errors => &mut self.errors,
            Section::Signature => &mut self.signature,
            Section::Metrics => &mut self.metrics,
        }
    }

    /// Broadcast `error` to every open section and the status slot, then
    /// close everything. No-op when the response already completed.
    fn fail(&mut self, error: &Error) {
        if self.completed {
            return;
        }
        for section in [
            Section::Rows,
            Section::Errors,
            Section::Signature,
            Section::Metrics,
        ] {
            if let Some(sender) = self.sender_mut(section).take() {
                let _ = sender.send(Err(error.clone()));
            }
        }
        if let Some(status) = self.status.take() {
            let _ = status.send(Err(error.clone()));
        }
        self.completed = true;
    }
}

/// Transport-facing half of a streamed response. Cloneable handle; the
/// transport callback feeds it chunks in arrival order.
#[derive(Clone)]
pub struct QueryDecoder {
    codec: Arc<dyn ChunkCodec>,
    shared: Arc<Mutex<Shared>>,
    cancelled: Arc<AtomicBool>,
    request_id: String,
}

impl QueryDecoder {
    /// Create a decoder/result pair for one in-flight query.
    ///
    /// `client_context_id` defaults to a fresh UUID when the caller did not
    /// supply one with the request.
    pub fn streamed(
        request_id: impl Into<String>,
        client_context_id: Option<String>,
        codec: Arc<dyn ChunkCodec>,
    ) -> (QueryDecoder, StreamedQueryResult) {
        let request_id = request_id.into();
        let client_context_id =
            client_context_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let (rows_tx, rows_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (signature_tx, signature_rx) = mpsc::unbounded_channel();
        let (metrics_tx, metrics_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = oneshot::channel();

        let shared = Arc::new(Mutex::new(Shared {
            rows: Some(rows_tx),
            errors: Some(errors_tx),
            signature: Some(signature_tx),
            metrics: Some(metrics_tx),
            status: Some(status_tx),
            completed: false,
        }));
        let cancelled = Arc::new(AtomicBool::new(false));

        let decoder = QueryDecoder {
            codec,
            shared: Arc::clone(&shared),
            cancelled: Arc::clone(&cancelled),
            request_id: request_id.clone(),
        };
        let result = StreamedQueryResult {
            rows: SectionStream::new(rows_rx, Arc::clone(&cancelled)),
            errors: SectionStream::new(errors_rx, Arc::clone(&cancelled)),
            signature: SectionStream::new(signature_rx, Arc::clone(&cancelled)),
            metrics: SectionStream::new(metrics_rx, Arc::clone(&cancelled)),
            status: Some(status_rx),
            status_memo: None,
            shared,
            cancelled,
            request_id,
            client_context_id,
        };
        (decoder, result)
    }

    /// Feed one chunk. A payload that fails to decode surfaces the
    /// transcoding error on that section's stream and `push` still returns
    /// `Ok`; only cancellation and late delivery are push errors. The chunk
    /// buffer is released before this returns, on every path.
    pub fn push(&self, chunk: QueryChunk) -> Result<()> {
        if self.cancelled.load(Ordering::Acquire) {
            // Buffer is released by drop on the way out.
            return Err(Error::Cancelled);
        }
        match chunk {
            QueryChunk::Payload { section, buffer } => {
                let decoded = self.codec.decode(buffer.bytes());
                drop(buffer);
                let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
                if shared.completed {
                    return Err(Error::ChannelClosed);
                }
                match shared.sender_mut(section) {
                    Some(sender) => {
                        if let Err(e) = &decoded {
                            warn!(
                                request_id = %self.request_id,
                                ?section,
                                error = %e,
                                "chunk failed to decode"
                            );
                        }
                        // A dropped receiver means the caller stopped
                        // consuming this section; not an error.
                        let _ = sender.send(decoded);
                    }
                    None => return Err(Error::ChannelClosed),
                }
                Ok(())
            }
            QueryChunk::SectionEnd(section) => {
                let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
                if shared.completed {
                    return Err(Error::ChannelClosed);
                }
                debug!(request_id = %self.request_id, ?section, "section complete");
                shared.sender_mut(section).take();
                Ok(())
            }
            QueryChunk::Status { success } => {
                let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
                if shared.completed {
                    return Err(Error::ChannelClosed);
                }
                debug!(request_id = %self.request_id, success, "terminal status observed");
                if let Some(status) = shared.status.take() {
                    let _ = status.send(Ok(success));
                }
                // Nothing may follow the terminal marker; close the rest.
                shared.rows.take();
                shared.errors.take();
                shared.signature.take();
                shared.metrics.take();
                shared.completed = true;
                Ok(())
            }
        }
    }

    /// Transport-level failure: abort every open section and the final
    /// status with the same error.
    pub fn fail(&self, error: Error) {
        warn!(request_id = %self.request_id, %error, "response aborted");
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.fail(&error);
    }

    /// Bound the remaining decode lifecycle. If the terminal status has not
    /// arrived within `deadline`, every open section fails with `Timeout`.
    /// Must be called from within a tokio runtime.
    pub fn arm_deadline(&self, deadline: Duration) {
        let shared = Arc::clone(&self.shared);
        let request_id = self.request_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());
            if !shared.completed {
                warn!(request_id = %request_id, "decode deadline expired");
                shared.fail(&Error::Timeout);
            }
        });
    }
}

impl fmt::Debug for QueryDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDecoder")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Lazy sequence of decoded values for one section. Elements arrive in
/// transport order; a per-chunk transcoding failure is an `Err` element and
/// does not end the stream.
pub struct SectionStream {
    rx: mpsc::UnboundedReceiver<Result<Value>>,
    cancelled: Arc<AtomicBool>,
    cancel_reported: bool,
}

impl SectionStream {
    fn new(rx: mpsc::UnboundedReceiver<Result<Value>>, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            cancelled,
            cancel_reported: false,
        }
    }
}

impl Stream for SectionStream {
    type Item = Result<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel_reported {
            return Poll::Ready(None);
        }
        if self.cancelled.load(Ordering::Acquire) {
            self.cancel_reported = true;
            return Poll::Ready(Some(Err(Error::Cancelled)));
        }
        self.rx.poll_recv(cx)
    }
}

impl fmt::Debug for SectionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionStream").finish_non_exhaustive()
    }
}

/// Counters reported in the metrics section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryMetrics {
    pub result_count: u64,
    pub result_size: u64,
    pub elapsed_time: String,
    pub execution_time: String,
    pub error_count: u64,
    pub warning_count: u64,
    pub mutation_count: u64,
    pub sort_count: u64,
}

impl QueryMetrics {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

/// One entry of the errors section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryError {
    pub code: i64,
    pub msg: String,
}

impl QueryError {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

/// Caller-facing half of a streamed response.
///
/// Every accessor is independently consumable: draining the rows never
/// forces the errors or metrics sections, and vice versa.
pub struct StreamedQueryResult {
    rows: SectionStream,
    errors: SectionStream,
    signature: SectionStream,
    metrics: SectionStream,
    status: Option<oneshot::Receiver<Result<bool>>>,
    status_memo: Option<Result<bool>>,
    shared: Arc<Mutex<Shared>>,
    cancelled: Arc<AtomicBool>,
    request_id: String,
    client_context_id: String,
}

impl StreamedQueryResult {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn client_context_id(&self) -> &str {
        &self.client_context_id
    }

    /// Lazy stream of result rows.
    pub fn rows(&mut self) -> &mut SectionStream {
        &mut self.rows
    }

    /// Lazy stream of error-section entries.
    pub fn errors(&mut self) -> &mut SectionStream {
        &mut self.errors
    }

    /// The signature value, if the response carries one. Suspends until the
    /// signature chunk arrives or its section closes.
    pub async fn signature(&mut self) -> Option<Result<Value>> {
        self.signature.next().await
    }

    /// Typed metrics, if the response carries them.
    pub async fn metrics(&mut self) -> Option<Result<QueryMetrics>> {
        self.metrics
            .next()
            .await
            .map(|value| QueryMetrics::from_value(&value?))
    }

    /// Whether the query completed successfully. Suspends until the terminal
    /// status marker is observed; never returns a default before that.
    /// Memoized after first resolution.
    pub async fn final_success(&mut self) -> Result<bool> {
        if let Some(memo) = &self.status_memo {
            return memo.clone();
        }
        let outcome = match self.status.take() {
            Some(rx) => match rx.await {
                Ok(outcome) => outcome,
                Err(_) => {
                    if self.cancelled.load(Ordering::Acquire) {
                        Err(Error::Cancelled)
                    } else {
                        Err(Error::ChannelClosed)
                    }
                }
            },
            None => Err(Error::ChannelClosed),
        };
        self.status_memo = Some(outcome.clone());
        outcome
    }

    /// Cancel the whole decode. In-flight buffers on the decoder side are
    /// still released; all further consumption and pushing fails with
    /// `Cancelled` instead of hanging.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.fail(&Error::Cancelled);
    }
}

impl fmt::Debug for StreamedQueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamedQueryResult")
            .field("request_id", &self.request_id)
            .field("client_context_id", &self.client_context_id)
            .finish_non_exhaustive()
    }
}
