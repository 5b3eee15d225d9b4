//! [`LandingClient`] — drives the four Landing call patterns over one
//! channel.
//!
//! Every outbound call carries the fixed metadata pairs and a per-call
//! deadline. After each call the client logs the server's initial
//! metadata, every result verbatim, then the trailing metadata. Failures
//! surface as [`HermodError::Status`]; the client never retries
//! internally — retry belongs to the caller.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::{KeyAndValueRef, MetadataMap, MetadataValue};
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::{debug, error, info};

use crate::server::proto::landing_service_client::LandingServiceClient;
use crate::server::proto::{TalkRequest, TalkResponse};
use crate::{HermodError, Result, conn, status, telemetry};

/// Metadata pairs attached to every outbound call.
const CALL_METADATA: [(&str, &str); 2] = [("k1", "v1"), ("k2", "v2")];

/// Per-call deadline.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Spacing between streamed sends. A demo pacing artifact, not a
/// backpressure mechanism.
const SEND_SPACING: Duration = Duration::from_millis(2);

/// A Landing service client.
///
/// Holds one [`Channel`]; all four call patterns share it. The channel
/// is safe for concurrent calls and never mutated after construction.
pub struct LandingClient {
    inner: LandingServiceClient<Channel>,
}

impl LandingClient {
    /// Connect using the environment-resolved target and TLS settings.
    pub async fn connect() -> Result<Self> {
        let channel = conn::build_channel().await?;
        Ok(Self::from_channel(channel))
    }

    /// Wrap an already-established channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: LandingServiceClient::new(channel),
        }
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        for (key, value) in CALL_METADATA {
            request
                .metadata_mut()
                .insert(key, MetadataValue::from_static(value));
        }
        request.set_timeout(CALL_TIMEOUT);
        request
    }

    /// Unary call.
    pub async fn talk(&self, talk_request: TalkRequest) -> Result<TalkResponse> {
        info!(data = %talk_request.data, meta = %talk_request.meta, "sending unary request");
        let start = Instant::now();
        let response = self
            .inner
            .clone()
            .talk(self.request(talk_request))
            .await
            .map_err(|s| call_failed("Talk", s))?;
        record_duration("Talk", start);

        let (metadata, message, _) = response.into_parts();
        log_metadata("Talk", "initial", &metadata);
        log_response(&message);
        // tonic folds unary trailers into the single response metadata
        // map; there is no separate trailing map to report.
        Ok(message)
    }

    /// Server-streaming call. Returns every response in arrival order.
    pub async fn talk_one_answer_more(
        &self,
        talk_request: TalkRequest,
    ) -> Result<Vec<TalkResponse>> {
        info!(data = %talk_request.data, meta = %talk_request.meta, "starting server streaming");
        let start = Instant::now();
        let response = self
            .inner
            .clone()
            .talk_one_answer_more(self.request(talk_request))
            .await
            .map_err(|s| call_failed("TalkOneAnswerMore", s))?;

        log_metadata("TalkOneAnswerMore", "initial", response.metadata());
        let mut stream = response.into_inner();
        let mut responses = Vec::new();
        while let Some(message) = stream
            .message()
            .await
            .map_err(|s| call_failed("TalkOneAnswerMore", s))?
        {
            log_response(&message);
            responses.push(message);
        }
        if let Some(trailers) = stream
            .trailers()
            .await
            .map_err(|s| call_failed("TalkOneAnswerMore", s))?
        {
            log_metadata("TalkOneAnswerMore", "trailing", &trailers);
        }
        record_duration("TalkOneAnswerMore", start);
        info!(responses = responses.len(), "server streaming completed");
        Ok(responses)
    }

    /// Client-streaming call. Sends every request, then returns the
    /// single aggregated response.
    pub async fn talk_more_answer_one(
        &self,
        requests: Vec<TalkRequest>,
    ) -> Result<TalkResponse> {
        info!(requests = requests.len(), "starting client streaming");
        let start = Instant::now();

        let (tx, rx) = mpsc::channel(requests.len().max(1));
        let sender = tokio::spawn(async move {
            for talk_request in requests {
                debug!(data = %talk_request.data, "sending client stream item");
                if tx.send(talk_request).await.is_err() {
                    break;
                }
                tokio::time::sleep(SEND_SPACING).await;
            }
        });

        let response = self
            .inner
            .clone()
            .talk_more_answer_one(self.request(ReceiverStream::new(rx)))
            .await
            .map_err(|s| call_failed("TalkMoreAnswerOne", s))?;
        sender
            .await
            .map_err(|e| HermodError::Transport(format!("send task failed: {e}")))?;
        record_duration("TalkMoreAnswerOne", start);

        let (metadata, message, _) = response.into_parts();
        log_metadata("TalkMoreAnswerOne", "initial", &metadata);
        log_response(&message);
        Ok(message)
    }

    /// Bidirectional call. One task performs the outbound writes while
    /// this task drains inbound reads; both are joined before the call
    /// is considered complete.
    pub async fn talk_bidirectional(
        &self,
        requests: Vec<TalkRequest>,
    ) -> Result<Vec<TalkResponse>> {
        info!(requests = requests.len(), "starting bidirectional streaming");
        let start = Instant::now();

        let (tx, rx) = mpsc::channel(1);
        let sender = tokio::spawn(async move {
            for talk_request in requests {
                debug!(data = %talk_request.data, "sending bidirectional item");
                if tx.send(talk_request).await.is_err() {
                    break;
                }
                tokio::time::sleep(SEND_SPACING).await;
            }
        });

        let response = self
            .inner
            .clone()
            .talk_bidirectional(self.request(ReceiverStream::new(rx)))
            .await
            .map_err(|s| call_failed("TalkBidirectional", s))?;

        log_metadata("TalkBidirectional", "initial", response.metadata());
        let mut stream = response.into_inner();
        let mut responses = Vec::new();
        while let Some(message) = stream
            .message()
            .await
            .map_err(|s| call_failed("TalkBidirectional", s))?
        {
            log_response(&message);
            responses.push(message);
        }
        sender
            .await
            .map_err(|e| HermodError::Transport(format!("send task failed: {e}")))?;
        if let Some(trailers) = stream
            .trailers()
            .await
            .map_err(|s| call_failed("TalkBidirectional", s))?
        {
            log_metadata("TalkBidirectional", "trailing", &trailers);
        }
        record_duration("TalkBidirectional", start);
        info!(responses = responses.len(), "bidirectional streaming completed");
        Ok(responses)
    }
}

/// Log a failed call and convert the status into a typed error.
fn call_failed(method: &'static str, s: Status) -> HermodError {
    error!(
        method,
        code = ?s.code(),
        error = %status::format_status(&s),
        "call failed"
    );
    HermodError::from(s)
}

fn record_duration(method: &'static str, start: Instant) {
    metrics::histogram!(telemetry::CALL_DURATION_SECONDS, "method" => method)
        .record(start.elapsed().as_secs_f64());
}

fn log_metadata(method: &str, stage: &str, metadata: &MetadataMap) {
    for entry in metadata.iter() {
        match entry {
            KeyAndValueRef::Ascii(key, value) => {
                debug!(method, stage, key = key.as_str(), value = ?value, "response metadata");
            }
            KeyAndValueRef::Binary(key, value) => {
                debug!(method, stage, key = key.as_str(), value = ?value, "response metadata (binary)");
            }
        }
    }
}

/// Log a response and each of its results, fields verbatim.
fn log_response(response: &TalkResponse) {
    info!(
        status = response.status,
        results = response.results.len(),
        "response received"
    );
    for result in &response.results {
        let kv = &result.kv;
        info!(
            id = result.id,
            kind = result.r#type,
            kv_id = kv.get("id").map_or("", String::as_str),
            idx = kv.get("idx").map_or("", String::as_str),
            meta = kv.get("meta").map_or("", String::as_str),
            data = kv.get("data").map_or("", String::as_str),
            "talk result"
        );
    }
}
