//! Landing service implementation.
//!
//! Each call moves through the same states: received, then either
//! answered locally from the greeting catalog or forwarded to the
//! upstream backend, then responded. Dispatch is on [`ServerMode`];
//! there is no backend nil-checking at call time.
//!
//! Proxy mode relays requests verbatim and passes upstream results
//! (including failures) back unchanged. The bidirectional relay is
//! half-duplex: the inbound stream is drained before the upstream call
//! is opened.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::{KeyAndValueRef, MetadataMap, MetadataValue};
use tonic::transport::Channel;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::proto::landing_service_client::LandingServiceClient;
use super::proto::landing_service_server::LandingService;
use super::proto::{ResultType, TalkRequest, TalkResponse, TalkResult};
use crate::catalog;
use crate::telemetry;

/// Tracing headers forwarded verbatim to the upstream backend when
/// proxying. Propagated, never interpreted.
pub const TRACING_HEADERS: [&str; 7] = [
    "x-request-id",
    "x-b3-traceid",
    "x-b3-spanid",
    "x-b3-parentspanid",
    "x-b3-sampled",
    "x-b3-flags",
    "x-ot-span-context",
];

/// Operating mode, fixed at startup.
pub enum ServerMode {
    /// Answer every call locally from the greeting catalog.
    Standalone,
    /// Relay every call to the upstream Landing service behind this
    /// channel.
    Proxy(LandingServiceClient<Channel>),
}

/// The Landing service. Wraps a [`ServerMode`] and serves all four call
/// patterns.
pub struct HermodService {
    mode: ServerMode,
}

impl HermodService {
    /// Create a service in the given mode.
    pub fn new(mode: ServerMode) -> Self {
        Self { mode }
    }

    /// Standalone service answering from the greeting catalog.
    pub fn standalone() -> Self {
        Self::new(ServerMode::Standalone)
    }

    /// Proxy service relaying to the given upstream channel.
    pub fn proxy(channel: Channel) -> Self {
        Self::new(ServerMode::Proxy(LandingServiceClient::new(channel)))
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Build one result for a single request datum.
///
/// The kv map always carries exactly the keys `id`, `idx`, `data` and
/// `meta`. Non-numeric input clamps to the first catalog entry.
fn build_result(data: &str) -> TalkResult {
    let index = data.trim().parse::<usize>().unwrap_or(0);
    let hello = catalog::greeting(index);

    let mut kv = HashMap::new();
    kv.insert("id".to_string(), Uuid::new_v4().to_string());
    kv.insert("idx".to_string(), data.to_string());
    kv.insert("data".to_string(), format!("{hello},{}", catalog::thanks(hello)));
    kv.insert("meta".to_string(), "RUST".to_string());

    TalkResult {
        id: epoch_millis(),
        r#type: ResultType::Ok as i32,
        kv,
    }
}

fn local_response(data: &str) -> TalkResponse {
    TalkResponse {
        status: 200,
        results: vec![build_result(data)],
    }
}

/// Log every inbound metadata pair. Diagnostic only.
fn log_metadata(method: &str, metadata: &MetadataMap) {
    for entry in metadata.iter() {
        match entry {
            KeyAndValueRef::Ascii(key, value) => {
                debug!(method, key = key.as_str(), value = ?value, "inbound metadata");
            }
            KeyAndValueRef::Binary(key, value) => {
                debug!(method, key = key.as_str(), value = ?value, "inbound metadata (binary)");
            }
        }
    }
}

/// Copy the tracing-header whitelist from inbound metadata onto an
/// outbound request.
fn propagate_tracing_headers(inbound: &MetadataMap, outbound: &mut MetadataMap) {
    for key in TRACING_HEADERS {
        if let Some(value) = inbound.get(key) {
            debug!(key, value = ?value, "propagating tracing header");
            outbound.insert(key, value.clone());
        }
    }
}

/// Attach the fixed response metadata pairs for local-mode answers.
///
/// tonic exposes no hook for custom trailers on an Ok response, so both
/// the header pair and the trailer pair travel as response headers.
fn apply_response_metadata(metadata: &mut MetadataMap) {
    metadata.insert("h1", MetadataValue::from_static("v1"));
    metadata.insert("l1", MetadataValue::from_static("v1"));
}

/// Forward every message of an upstream response stream into a channel,
/// passing errors through to the caller.
fn relay_upstream(mut upstream: Streaming<TalkResponse>, tx: mpsc::Sender<Result<TalkResponse, Status>>) {
    tokio::spawn(async move {
        loop {
            match upstream.message().await {
                Ok(Some(response)) => {
                    if tx.send(Ok(response)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(status) => {
                    error!(error = %status, "upstream stream failed");
                    let _ = tx.send(Err(status)).await;
                    break;
                }
            }
        }
    });
}

#[tonic::async_trait]
impl LandingService for HermodService {
    async fn talk(
        &self,
        request: Request<TalkRequest>,
    ) -> Result<Response<TalkResponse>, Status> {
        metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => "Talk").increment(1);
        log_metadata("Talk", request.metadata());

        let inbound_metadata = request.metadata().clone();
        let talk_request = request.into_inner();
        info!(data = %talk_request.data, meta = %talk_request.meta, "unary call received");

        match &self.mode {
            ServerMode::Proxy(client) => {
                let mut upstream = Request::new(talk_request);
                propagate_tracing_headers(&inbound_metadata, upstream.metadata_mut());
                let response = client.clone().talk(upstream).await.inspect_err(|status| {
                    error!(error = %status, "upstream unary call failed");
                })?;
                Ok(Response::new(response.into_inner()))
            }
            ServerMode::Standalone => {
                let mut response = Response::new(local_response(&talk_request.data));
                apply_response_metadata(response.metadata_mut());
                Ok(response)
            }
        }
    }

    type TalkOneAnswerMoreStream =
        Pin<Box<dyn Stream<Item = Result<TalkResponse, Status>> + Send + 'static>>;

    async fn talk_one_answer_more(
        &self,
        request: Request<TalkRequest>,
    ) -> Result<Response<Self::TalkOneAnswerMoreStream>, Status> {
        metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => "TalkOneAnswerMore").increment(1);
        log_metadata("TalkOneAnswerMore", request.metadata());

        let inbound_metadata = request.metadata().clone();
        let talk_request = request.into_inner();
        info!(data = %talk_request.data, meta = %talk_request.meta, "server streaming call received");

        let (tx, rx) = mpsc::channel(4);
        match &self.mode {
            ServerMode::Proxy(client) => {
                let mut upstream = Request::new(talk_request);
                propagate_tracing_headers(&inbound_metadata, upstream.metadata_mut());
                let response = client
                    .clone()
                    .talk_one_answer_more(upstream)
                    .await
                    .inspect_err(|status| {
                        error!(error = %status, "upstream server streaming call failed");
                    })?;
                relay_upstream(response.into_inner(), tx);
            }
            ServerMode::Standalone => {
                tokio::spawn(async move {
                    for part in talk_request.data.split(',') {
                        if tx.send(Ok(local_response(part))).await.is_err() {
                            break;
                        }
                    }
                });
            }
        }
        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn talk_more_answer_one(
        &self,
        request: Request<Streaming<TalkRequest>>,
    ) -> Result<Response<TalkResponse>, Status> {
        metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => "TalkMoreAnswerOne").increment(1);
        log_metadata("TalkMoreAnswerOne", request.metadata());

        let inbound_metadata = request.metadata().clone();
        let mut inbound = request.into_inner();

        match &self.mode {
            ServerMode::Proxy(client) => {
                let mut requests = Vec::new();
                while let Some(item) = inbound.next().await {
                    requests.push(item?);
                }
                let mut upstream = Request::new(futures_util::stream::iter(requests));
                propagate_tracing_headers(&inbound_metadata, upstream.metadata_mut());
                let response = client
                    .clone()
                    .talk_more_answer_one(upstream)
                    .await
                    .inspect_err(|status| {
                        error!(error = %status, "upstream client streaming call failed");
                    })?;
                Ok(Response::new(response.into_inner()))
            }
            ServerMode::Standalone => {
                let mut results = Vec::new();
                while let Some(item) = inbound.next().await {
                    let talk_request = item?;
                    info!(data = %talk_request.data, meta = %talk_request.meta, "client stream item");
                    results.push(build_result(&talk_request.data));
                }
                let mut response = Response::new(TalkResponse {
                    status: 200,
                    results,
                });
                apply_response_metadata(response.metadata_mut());
                Ok(response)
            }
        }
    }

    type TalkBidirectionalStream =
        Pin<Box<dyn Stream<Item = Result<TalkResponse, Status>> + Send + 'static>>;

    async fn talk_bidirectional(
        &self,
        request: Request<Streaming<TalkRequest>>,
    ) -> Result<Response<Self::TalkBidirectionalStream>, Status> {
        metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => "TalkBidirectional").increment(1);
        log_metadata("TalkBidirectional", request.metadata());

        let inbound_metadata = request.metadata().clone();
        let mut inbound = request.into_inner();

        match &self.mode {
            ServerMode::Proxy(client) => {
                // Half-duplex relay: the inbound stream is drained fully
                // before the upstream call opens.
                let mut requests = Vec::new();
                while let Some(item) = inbound.next().await {
                    requests.push(item?);
                }
                let mut upstream = Request::new(futures_util::stream::iter(requests));
                propagate_tracing_headers(&inbound_metadata, upstream.metadata_mut());
                let response = client
                    .clone()
                    .talk_bidirectional(upstream)
                    .await
                    .inspect_err(|status| {
                        error!(error = %status, "upstream bidirectional call failed");
                    })?;
                let (tx, rx) = mpsc::channel(4);
                relay_upstream(response.into_inner(), tx);
                Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
            }
            ServerMode::Standalone => {
                // One response per request, at most one in flight.
                let (tx, rx) = mpsc::channel(1);
                tokio::spawn(async move {
                    while let Some(item) = inbound.next().await {
                        let message = match item {
                            Ok(talk_request) => {
                                info!(
                                    data = %talk_request.data,
                                    meta = %talk_request.meta,
                                    "bidirectional stream item"
                                );
                                Ok(local_response(&talk_request.data))
                            }
                            Err(status) => Err(status),
                        };
                        let failed = message.is_err();
                        if tx.send(message).await.is_err() || failed {
                            break;
                        }
                    }
                });
                Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_carries_all_four_keys() {
        let result = build_result("1");
        for key in ["id", "idx", "data", "meta"] {
            assert!(result.kv.contains_key(key), "missing kv key {key}");
            assert!(!result.kv[key].is_empty(), "empty kv value for {key}");
        }
        assert_eq!(result.kv["idx"], "1");
        assert_eq!(result.kv["data"], "Bonjour,Merci beaucoup");
        assert_eq!(result.r#type, ResultType::Ok as i32);
    }

    #[test]
    fn malformed_datum_clamps_to_first_entry() {
        let result = build_result("not-a-number");
        assert_eq!(result.kv["data"], "Hello,Thank you very much");
        // The original datum is still echoed back
        assert_eq!(result.kv["idx"], "not-a-number");
    }
}
