//! Push mode: newHeads subscription, head-driven probes and reconnect budget

mod common;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

use common::{block_hash, block_json, target_config, test_config, MockRpcServer, RecordingNotifier};
use monitor::alerts::AlertService;
use monitor::errors::MonitorError;
use monitor::health::{HealthMonitor, ProbeStatus};
use monitor::rpc::{BlockInfo, HeadSubscription};
use monitor::scheduler::{BackoffPolicy, Orchestrator};

/// Minimal node WebSocket: confirms one `eth_subscribe`, pushes `heads`,
/// then either closes or waits for the client to go away
async fn spawn_head_server(heads: Vec<Value>, hold_open: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let request = ws.next().await.unwrap().unwrap();
        let request: Value = serde_json::from_str(request.to_text().unwrap()).unwrap();
        assert_eq!(request["method"], "eth_subscribe");
        assert_eq!(request["params"][0], "newHeads");

        let ack = json!({ "jsonrpc": "2.0", "id": request["id"], "result": "0x9ce59a13059e417087c02d3236a0b1cc" });
        ws.send(Message::Text(ack.to_string().into())).await.unwrap();

        for head in heads {
            let notification = json!({
                "jsonrpc": "2.0",
                "method": "eth_subscription",
                "params": { "subscription": "0x9ce59a13059e417087c02d3236a0b1cc", "result": head }
            });
            ws.send(Message::Text(notification.to_string().into())).await.unwrap();
        }

        if hold_open {
            while let Some(Ok(_)) = ws.next().await {}
        } else {
            let _ = ws.close(None).await;
        }
    });

    format!("ws://{}", addr)
}

fn now() -> u64 {
    Utc::now().timestamp() as u64
}

#[tokio::test]
async fn test_subscription_yields_heads_until_closed() {
    let ws_url = spawn_head_server(vec![block_json(100, &block_hash("aaaa", 100), 1_700_000_000)], false).await;

    let mut subscription = HeadSubscription::connect(&ws_url, Duration::from_secs(2)).await.unwrap();

    let head = subscription.next_head(Duration::from_secs(2)).await.unwrap().unwrap();
    assert_eq!(head.number, 100);
    assert_eq!(head.hash, block_hash("aaaa", 100));
    assert_eq!(head.timestamp, 1_700_000_000);

    assert!(subscription.next_head(Duration::from_secs(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_idle_subscription_times_out() {
    let ws_url = spawn_head_server(vec![], true).await;
    let mut subscription = HeadSubscription::connect(&ws_url, Duration::from_secs(2)).await.unwrap();

    assert!(subscription.next_head(Duration::from_millis(200)).await.is_err());
}

#[tokio::test]
async fn test_pushed_head_runs_block_probes() {
    let tip = 200;
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(tip, now(), 1, 50).await;
    let reference = MockRpcServer::start().await;
    reference.mock_chain(tip + 20, now(), 12, "aaaa").await;

    let ws_url = spawn_head_server(vec![block_json(tip, &block_hash("aaaa", tip), now())], true).await;

    let mut target = target_config("node", &node.base_url);
    target.ws_url = Some(ws_url);
    let config = test_config(vec![target], vec![reference.base_url.clone()]);

    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = Arc::new(
        HealthMonitor::from_config(&config, Arc::new(AlertService::new(notifier.clone(), true))).unwrap(),
    );
    let orchestrator = Orchestrator::new(monitor, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(async move { orchestrator.run_push(shutdown_rx).await });

    let mut waited = Duration::ZERO;
    while notifier.matching("out_of_sync").is_empty() && waited < Duration::from_secs(10) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += Duration::from_millis(50);
    }
    assert_eq!(notifier.matching("out_of_sync").len(), 1);

    shutdown_tx.send(true).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(10), run).await.unwrap().unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_pushed_head_does_not_mask_http_outage() {
    let node = MockRpcServer::start().await;
    node.mock_unavailable().await;
    let reference = MockRpcServer::start().await;
    reference.mock_chain(300, now(), 12, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = HealthMonitor::from_config(&config, Arc::new(AlertService::new(notifier.clone(), true))).unwrap();

    monitor.run_cycle().await;
    assert_eq!(notifier.matching("rpc_unreachable").len(), 1);

    // The websocket keeps delivering heads while HTTP stays down
    let head = BlockInfo {
        number: 300,
        hash: block_hash("aaaa", 300),
        timestamp: now(),
    };
    let results = monitor.targets()[0].check_block(Some(head)).await;
    let unreachable = results
        .iter()
        .find(|result| result.key.to_string() == "node:rpc_unreachable")
        .unwrap();
    assert_eq!(unreachable.status, ProbeStatus::Error);

    monitor.dispatch(&results).await;
    assert!(notifier.matching("RECOVERED").is_empty(), "sent: {:?}", notifier.sent());
    assert_eq!(monitor.alerts().active_alerts().await, 1);
}

#[tokio::test]
async fn test_exhausted_reconnects_notify_and_fail() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;

    // Nothing listens on the discard port
    let mut target = target_config("node", &node.base_url);
    target.ws_url = Some("ws://127.0.0.1:9".to_string());
    let config = test_config(vec![target], vec![node.base_url.clone()]);

    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = Arc::new(
        HealthMonitor::from_config(&config, Arc::new(AlertService::new(notifier.clone(), true))).unwrap(),
    );
    let orchestrator = Orchestrator::new(monitor, &config).with_backoff(BackoffPolicy {
        base: Duration::from_millis(10),
        factor: 2,
        max_delay: Duration::from_millis(40),
        max_attempts: 3,
    });

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let outcome = tokio::time::timeout(Duration::from_secs(10), orchestrator.run_push(shutdown_rx))
        .await
        .unwrap();

    match outcome {
        Err(MonitorError::ReconnectExhausted { endpoint, attempts }) => {
            assert_eq!(endpoint, "ws://127.0.0.1:9");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected reconnect exhaustion, got {:?}", other),
    }
    assert_eq!(notifier.matching("FATAL").len(), 1);
}
