use bytes::Bytes;
use logzio_sink::sender::{ClientConfig, listener_url};
use logzio_sink::{
    BatchingEngine, DeliveryClient, DeliveryFailure, EventRecord, HttpDeliveryClient, Level,
    PayloadEncoder, SinkOptions,
};
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

fn test_client() -> HttpDeliveryClient {
    HttpDeliveryClient::new(ClientConfig {
        timeout: Duration::from_secs(5),
        connection_timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap()
}

fn server_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/?token=secret-token&type=rust", server.uri())).unwrap()
}

#[tokio::test]
async fn test_send_posts_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(query_param("token", "secret-token"))
        .and(query_param("type", "rust"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"message\":\"hello\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client();
    let body = PayloadEncoder::default().encode(&[EventRecord::new(
        Level::Information,
        "hello",
        "hello",
    )]);

    let result = client
        .send(&server_url(&mock_server), Bytes::from(body), "application/json")
        .await;
    assert!(result.is_ok());

    let stats = client.connection_stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.failed_requests, 0);
}

#[tokio::test]
async fn test_server_error_is_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = test_client();
    let failure = client
        .send(&server_url(&mock_server), Bytes::from_static(b"{}"), "application/json")
        .await
        .unwrap_err();

    assert_eq!(failure.status(), Some(500));
    assert!(failure.is_transient());
    let text = failure.to_string();
    assert!(text.contains("Internal Server Error"), "{text}");
    assert!(!text.contains("secret-token"), "{text}");
    assert_eq!(client.connection_stats().failed_requests, 1);
}

#[tokio::test]
async fn test_client_error_is_not_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let failure = test_client()
        .send(&server_url(&mock_server), Bytes::from_static(b"{}"), "application/json")
        .await
        .unwrap_err();

    assert_eq!(failure.status(), Some(401));
    assert!(!failure.is_transient());
}

#[tokio::test]
async fn test_too_many_requests_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let failure = test_client()
        .send(&server_url(&mock_server), Bytes::from_static(b"{}"), "application/json")
        .await
        .unwrap_err();
    assert!(failure.is_transient());
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = HttpDeliveryClient::new(ClientConfig {
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let failure = client
        .send(&server_url(&mock_server), Bytes::from_static(b"{}"), "application/json")
        .await
        .unwrap_err();
    assert!(matches!(failure, DeliveryFailure::Timeout { .. }), "{failure:?}");
    assert!(failure.is_transient());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    // Nothing listens on the discard port.
    let url = Url::parse("http://127.0.0.1:9/?token=secret-token&type=rust").unwrap();
    let failure = test_client()
        .send(&url, Bytes::from_static(b"{}"), "application/json")
        .await
        .unwrap_err();

    assert!(
        matches!(
            failure,
            DeliveryFailure::Transport { .. } | DeliveryFailure::Timeout { .. }
        ),
        "{failure:?}"
    );
    assert!(!failure.to_string().contains("secret-token"));
}

#[tokio::test]
async fn test_send_after_release_fails() {
    let mut client = test_client();
    client.release();
    assert!(client.is_released());

    let failure = client
        .send(
            &Url::parse("http://127.0.0.1:9/").unwrap(),
            Bytes::from_static(b"{}"),
            "application/json",
        )
        .await
        .unwrap_err();
    assert!(matches!(failure, DeliveryFailure::Released { .. }));
}

#[tokio::test]
async fn test_engine_ships_to_listener() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(query_param("token", "secret-token"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = test_client();
    let client_stats = client.stats();
    let engine = BatchingEngine::start(
        client,
        server_url(&mock_server),
        logzio_sink::BatchSettings {
            batch_posting_limit: 2,
            period: Duration::from_millis(50),
            ..Default::default()
        },
        PayloadEncoder::new(true),
    )
    .unwrap();

    for i in 0..5 {
        engine
            .enqueue(
                EventRecord::builder(Level::Warning, "Disk {Pct}")
                    .rendered(format!("Disk {i}"))
                    .property("Pct", i)
                    .build(),
            )
            .unwrap();
    }
    engine.shutdown().await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let bodies: Vec<String> = requests
        .iter()
        .map(|r| String::from_utf8(r.body.clone()).unwrap())
        .collect();
    assert!(bodies[0].contains("\"RenderedMessage\":\"Disk 0\""));
    assert!(bodies[0].contains("\"Pct\":0"));
    assert!(bodies[2].contains("\"RenderedMessage\":\"Disk 4\""));

    assert_eq!(engine.stats().events_sent, 5);
    assert_eq!(client_stats.snapshot().successful_requests, 3);
}

#[tokio::test]
async fn test_failed_responses_are_counted_and_discarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let engine = SinkOptions {
        url_override: Some(format!("{}/bulk?token=secret-token", mock_server.uri())),
        batch_posting_limit: 10,
        ..SinkOptions::new("secret-token")
    }
    .start()
    .unwrap();

    for i in 0..3 {
        engine
            .enqueue(EventRecord::new(Level::Error, "boom", format!("boom {i}")))
            .unwrap();
    }
    engine.shutdown().await;

    let stats = engine.stats();
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.events_discarded, 3);
    assert_eq!(stats.events_sent, 0);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[test]
fn test_listener_url_for_sink_defaults() {
    let url = listener_url("abc", "rust", true, "listener.logz.io", None).unwrap();
    assert_eq!(url.port(), Some(8071));
    assert_eq!(url.scheme(), "https");
}
