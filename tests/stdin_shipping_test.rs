mod common;

use common::{RecordingClient, test_url};
use logzio_sink::app::{SOURCE_CONTEXT, ship_lines};
use logzio_sink::{BatchSettings, BatchingEngine, Level, PayloadEncoder};
use std::time::Duration;
use tokio::io::BufReader;

fn start(client: RecordingClient) -> BatchingEngine {
    BatchingEngine::start(
        client,
        test_url(),
        BatchSettings {
            batch_posting_limit: 10,
            period: Duration::from_secs(60),
            ..Default::default()
        },
        PayloadEncoder::new(false),
    )
    .unwrap()
}

#[tokio::test]
async fn test_lines_are_shipped_until_eof() {
    let client = RecordingClient::new();
    let engine = start(client.clone());

    let input: &[u8] = b"first line\n\n   \nsecond line\nthird line";
    let accepted = ship_lines(
        BufReader::new(input),
        &engine,
        "web-1",
        Level::Information,
        std::future::pending(),
    )
    .await
    .unwrap();
    engine.shutdown().await;

    assert_eq!(accepted, 3);
    assert_eq!(
        client.delivered_messages(),
        vec!["first line", "second line", "third line"]
    );

    let batches = client.batches();
    let first = &batches[0][0];
    assert_eq!(first["message"], "{Line}");
    assert_eq!(first["level"], "Information");
    assert_eq!(first["SourceContext"], SOURCE_CONTEXT);
    assert_eq!(first["Properties.Line"], "first line");
    assert_eq!(first["Properties.Host"], "web-1");
}

#[tokio::test]
async fn test_stop_signal_ends_reading() {
    let client = RecordingClient::new();
    let engine = start(client.clone());

    // A reader that never yields a line.
    let (reader, _writer) = tokio::io::duplex(64);
    let accepted = ship_lines(
        BufReader::new(reader),
        &engine,
        "web-1",
        Level::Information,
        tokio::time::sleep(Duration::from_millis(20)),
    )
    .await
    .unwrap();
    engine.shutdown().await;

    assert_eq!(accepted, 0);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_reading_stops_once_engine_is_closed() {
    let client = RecordingClient::new();
    let engine = start(client.clone());
    engine.shutdown().await;

    let input: &[u8] = b"late line\nanother\n";
    let accepted = ship_lines(
        BufReader::new(input),
        &engine,
        "web-1",
        Level::Information,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(accepted, 0);
    assert_eq!(engine.stats().rejected_after_shutdown, 1);
}

#[tokio::test]
async fn test_lines_take_the_configured_level() {
    let client = RecordingClient::new();
    let engine = start(client.clone());

    let input: &[u8] = b"disk almost full\n";
    ship_lines(
        BufReader::new(input),
        &engine,
        "web-1",
        Level::Warning,
        std::future::pending(),
    )
    .await
    .unwrap();
    engine.shutdown().await;

    assert_eq!(client.batches()[0][0]["level"], "Warning");
}
