//! Integration tests for the standalone Landing service.
//!
//! Starts an in-process server and drives it with [`LandingClient`],
//! validating each call pattern's shape, ordering, and the response
//! metadata contract.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tonic::Request;
use tonic::transport::Server;

use hermod::LandingClient;
use hermod::conn;
use hermod::server::HermodService;
use hermod::server::proto::TalkRequest;
use hermod::server::proto::landing_service_client::LandingServiceClient;
use hermod::server::proto::landing_service_server::LandingServiceServer;

/// Find an available port for testing.
async fn find_available_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a standalone test server on a random port and return its
/// address.
async fn start_standalone_server() -> SocketAddr {
    let addr = find_available_port().await;

    let service = LandingServiceServer::new(HermodService::standalone());
    tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve(addr)
            .await
            .unwrap();
    });

    // Give the server a moment to bind.
    tokio::time::sleep(Duration::from_millis(100)).await;

    addr
}

async fn connect(addr: SocketAddr) -> LandingClient {
    let channel = conn::connect(&addr.ip().to_string(), &addr.port().to_string(), false)
        .await
        .unwrap();
    LandingClient::from_channel(channel)
}

fn request(data: &str) -> TalkRequest {
    TalkRequest {
        data: data.to_string(),
        meta: "TEST".to_string(),
    }
}

#[tokio::test]
async fn unary_answers_from_the_catalog() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let response = client.talk(request("1")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.results.len(), 1);
    let kv = &response.results[0].kv;
    assert_eq!(kv["idx"], "1");
    assert_eq!(kv["data"], "Bonjour,Merci beaucoup");
    assert_eq!(kv["meta"], "RUST");
}

#[tokio::test]
async fn unary_results_carry_all_four_keys_non_empty() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let response = client.talk(request("3")).await.unwrap();

    let kv = &response.results[0].kv;
    for key in ["id", "idx", "meta", "data"] {
        assert!(
            kv.get(key).is_some_and(|v| !v.is_empty()),
            "kv[{key}] missing or empty"
        );
    }
}

#[tokio::test]
async fn unary_sets_response_metadata() {
    let addr = start_standalone_server().await;
    let mut raw = LandingServiceClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    let response = raw.talk(Request::new(request("0"))).await.unwrap();

    let metadata = response.metadata();
    assert_eq!(metadata.get("h1").unwrap().to_str().unwrap(), "v1");
    assert_eq!(metadata.get("l1").unwrap().to_str().unwrap(), "v1");
}

#[tokio::test]
async fn unary_clamps_malformed_data() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let response = client.talk(request("not-a-number")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.results[0].kv["data"], "Hello,Thank you very much");
}

#[tokio::test]
async fn server_streaming_emits_one_response_per_id_in_order() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let responses = client.talk_one_answer_more(request("0,1,2")).await.unwrap();

    assert_eq!(responses.len(), 3);
    for (response, expected) in responses.iter().zip(["0", "1", "2"]) {
        assert_eq!(response.status, 200);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].kv["idx"], expected);
    }
}

#[tokio::test]
async fn client_streaming_aggregates_in_send_order() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let requests = vec![request("3"), request("0"), request("5"), request("2")];
    let response = client.talk_more_answer_one(requests).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.results.len(), 4);
    let order: Vec<_> = response
        .results
        .iter()
        .map(|r| r.kv["idx"].as_str())
        .collect();
    assert_eq!(order, ["3", "0", "5", "2"]);
}

#[tokio::test]
async fn bidirectional_answers_one_to_one_in_order() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    let requests = vec![request("4"), request("1"), request("0")];
    let responses = client.talk_bidirectional(requests).await.unwrap();

    assert_eq!(responses.len(), 3);
    let order: Vec<_> = responses
        .iter()
        .map(|r| r.results[0].kv["idx"].as_str())
        .collect();
    assert_eq!(order, ["4", "1", "0"]);
}

#[tokio::test]
async fn greeting_round_trip_matches_catalog() {
    let addr = start_standalone_server().await;
    let client = connect(addr).await;

    for (index, expected) in [
        (0, "Hello,Thank you very much"),
        (1, "Bonjour,Merci beaucoup"),
        (2, "Hola,Muchas Gracias"),
        (3, "こんにちは,どうも ありがとう ございます"),
        (4, "Ciao,Mille Grazie"),
        (5, "안녕하세요,대단히 감사합니다"),
    ] {
        let response = client.talk(request(&index.to_string())).await.unwrap();
        assert_eq!(response.results[0].kv["data"], expected);
    }
}
