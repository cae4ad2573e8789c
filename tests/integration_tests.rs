//! Integration tests for LogMetrics

use logmetrics::client::Logger;
use logmetrics::config::{CollectorConfig, MessageBoundary};
use logmetrics::server::{MetricsServer, ReceiveOutcome, Report, ReportTrigger};
use logmetrics::types::{format_line, Severity};
use parking_lot::Mutex;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

type Reports = Arc<Mutex<Vec<Report>>>;

/// Helper function to create a loopback collector config
fn test_config(interval: u64, inactivity_ms: u64, boundary: MessageBoundary) -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.server.port = 0;
    config.server.poll_timeout_ms = 100;
    config.server.message_boundary = boundary;
    config.reporting.message_interval = interval;
    config.reporting.inactivity_timeout_ms = inactivity_ms;
    config.reporting.timer_cadence_ms = 20;
    config
}

/// Start a collector in the background, returning its address and collected reports
async fn start_collector(
    config: CollectorConfig,
) -> (SocketAddrV4, Reports, JoinHandle<logmetrics::Result<ReceiveOutcome>>) {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink_reports = Arc::clone(&reports);
    let sink = move |report: &Report| sink_reports.lock().push(report.clone());

    let server = MetricsServer::new(config, Arc::new(sink)).await.unwrap();
    let addr = match server.local_addr() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(_) => panic!("collector bound to IPv6"),
    };
    let handle = tokio::spawn(server.run());
    (addr, reports, handle)
}

/// Test the producer-to-collector path with count-based reports
#[tokio::test]
async fn test_count_based_reports() {
    let config = test_config(3, 60_000, MessageBoundary::Lines);
    let (addr, reports, handle) = start_collector(config).await;

    let logger = Logger::to_socket(addr, Duration::from_millis(1000), Severity::Debug)
        .await
        .unwrap();

    logger.info("one").await.unwrap();
    logger.debug("two").await.unwrap();
    logger.error("three").await.unwrap();
    logger.warning("four").await.unwrap();
    logger.fatal("five").await.unwrap();
    logger.info("six").await.unwrap();
    drop(logger);

    let outcome = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome.unwrap(), ReceiveOutcome::PeerDisconnected);

    let reports = reports.lock();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.trigger == ReportTrigger::MessageCount));
    assert_eq!(reports[0].stats.total_messages, 3);

    let last = &reports[1].stats;
    assert_eq!(last.total_messages, 6);
    assert_eq!(last.messages_last_hour, 6);
    assert_eq!(last.count(Severity::Info), 2);
    assert_eq!(last.count(Severity::Debug), 1);
    assert_eq!(last.count(Severity::Error), 1);
    assert_eq!(last.count(Severity::Warning), 1);
    assert_eq!(last.count(Severity::Fatal), 1);
    assert_eq!(last.min_length, 3);
    assert_eq!(last.max_length, 5);
}

/// Test the five-severity scenario end to end
#[tokio::test]
async fn test_length_statistics_over_the_wire() {
    let config = test_config(5, 60_000, MessageBoundary::Lines);
    let (addr, reports, handle) = start_collector(config).await;

    let logger = Logger::to_socket(addr, Duration::from_millis(1000), Severity::Debug)
        .await
        .unwrap();
    logger.error("Err").await.unwrap();
    logger.warning("Warning message").await.unwrap();
    logger.info("Info").await.unwrap();
    logger.debug("Debug msg").await.unwrap();
    logger.fatal("Fatal error!").await.unwrap();
    drop(logger);

    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

    let reports = reports.lock();
    assert_eq!(reports.len(), 1);
    let stats = &reports[0].stats;
    assert_eq!(stats.total_messages, 5);
    assert_eq!(stats.total_length, 43);
    assert_eq!(stats.min_length, 3);
    assert_eq!(stats.max_length, 15);
    assert!((stats.average_length - 8.6).abs() < 1e-9);
}

/// Test that an idle stream with unreported changes produces one report
#[tokio::test]
async fn test_inactivity_report() {
    let config = test_config(100, 200, MessageBoundary::Lines);
    let (addr, reports, handle) = start_collector(config).await;

    let logger = Logger::to_socket(addr, Duration::from_millis(1000), Severity::Info)
        .await
        .unwrap();
    logger.info("first").await.unwrap();
    logger.warning("second").await.unwrap();

    sleep(Duration::from_millis(700)).await;
    {
        let reports = reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].trigger, ReportTrigger::Inactivity);
        assert_eq!(reports[0].stats.total_messages, 2);
    }

    drop(logger);
    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(reports.lock().len(), 1);
}

/// Test that malformed lines are skipped without stopping the stream
#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let config = test_config(2, 60_000, MessageBoundary::Lines);
    let (addr, reports, handle) = start_collector(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = format!(
        "garbage without brackets\n{}\n[ts] [NOTICE] unknown level\n{}\n",
        format_line("kept", Severity::Info),
        format_line("also kept", Severity::Error),
    );
    stream.write_all(payload.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

    let reports = reports.lock();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stats.total_messages, 2);
    assert_eq!(reports[0].stats.count(Severity::Error), 1);
}

/// Test that a producer resetting its connection ends the run normally
#[tokio::test]
async fn test_producer_reset_is_a_disconnect() {
    let config = test_config(2, 60_000, MessageBoundary::Lines);
    let (addr, reports, handle) = start_collector(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = format!(
        "{}\n{}\n",
        format_line("before", Severity::Info),
        format_line("reset", Severity::Fatal),
    );
    stream.write_all(payload.as_bytes()).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    stream.set_linger(Some(Duration::ZERO)).unwrap();
    drop(stream);

    let outcome = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome.unwrap(), ReceiveOutcome::PeerDisconnected);
    assert_eq!(reports.lock().len(), 1);
}

/// Test the drain-cycle boundary policy with spaced-out sends
#[tokio::test]
async fn test_drain_cycle_boundary() {
    let (addr, reports, handle) =
        start_collector(test_config(2, 60_000, MessageBoundary::DrainCycle)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(format!("{}\n", format_line("first", Severity::Info)).as_bytes())
        .await
        .unwrap();
    sleep(Duration::from_millis(200)).await;
    stream
        .write_all(format!("{}\n", format_line("second", Severity::Info)).as_bytes())
        .await
        .unwrap();
    sleep(Duration::from_millis(200)).await;
    drop(stream);

    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

    let reports = reports.lock();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stats.total_messages, 2);
    assert_eq!(reports[0].stats.max_length, 6);
}

/// Test graceful shutdown while waiting for a producer
#[tokio::test]
async fn test_shutdown_without_producer() {
    let server = MetricsServer::new(
        test_config(10, 60_000, MessageBoundary::Lines),
        Arc::new(|_: &Report| {}),
    )
    .await
    .unwrap();

    let shutdown_tx = server.shutdown_handle();
    let handle = tokio::spawn(server.run());

    sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();

    let outcome = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert_eq!(outcome.unwrap(), ReceiveOutcome::Shutdown);
}

/// Test that invalid collector configuration is rejected before binding
#[tokio::test]
async fn test_invalid_config_rejected() {
    let mut config = test_config(10, 60_000, MessageBoundary::Lines);
    config.server.host = "not-an-ip".to_string();

    let result = MetricsServer::new(config, Arc::new(|_: &Report| {})).await;
    assert!(matches!(result, Err(logmetrics::LogMetricsError::Config(_))));
}
