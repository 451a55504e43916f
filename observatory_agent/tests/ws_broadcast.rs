//! End-to-end over a real socket: dashboard route, 404s, and snapshot pushes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, Stream, StreamExt};
use observatory_agent::config::AgentConfig;
use observatory_agent::derive::derive_memory_info;
use observatory_agent::registry::SessionRegistry;
use observatory_agent::sampler::spawn_sampler;
use observatory_agent::server::{host_assembler, router, serve};
use observatory_agent::types::{CoreUsage, Snapshot, SNAPSHOT_SCHEMA_VERSION};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

async fn start(registry: Arc<SessionRegistry>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(serve(listener, router(registry)));
    addr
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.expect("write");
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.expect("read");
    String::from_utf8_lossy(&buf).into_owned()
}

async fn wait_for_sessions(registry: &SessionRegistry, n: usize) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while registry.len() != n {
        assert!(Instant::now() < deadline, "expected {n} sessions, have {}", registry.len());
        sleep(Duration::from_millis(10)).await;
    }
}

fn snapshot(total: u64) -> Arc<Snapshot> {
    Arc::new(Snapshot {
        version: SNAPSHOT_SCHEMA_VERSION,
        captured_at: Utc::now(),
        cpu: vec![CoreUsage {
            core_index: 0,
            usage_percent: 12.5,
        }],
        memory: derive_memory_info(total, total / 4),
        network: Vec::new(),
        processes: Vec::new(),
    })
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = timeout(Duration::from_secs(3), ws.next())
            .await
            .expect("message within timeout")
            .expect("stream open")
            .expect("frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("json");
        }
    }
}

#[tokio::test]
async fn dashboard_and_not_found() {
    let addr = start(Arc::new(SessionRegistry::new())).await;

    let root = http_get(addr, "/").await;
    assert!(root.starts_with("HTTP/1.1 200"), "{root}");
    assert!(root.contains("text/html"));
    assert!(root.contains("<html"));

    let missing = http_get(addr, "/metrics").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
}

#[tokio::test]
async fn viewers_get_latest_on_connect_and_every_broadcast() {
    let registry = Arc::new(SessionRegistry::new());
    let addr = start(registry.clone()).await;
    let url = format!("ws://{addr}/ws");

    // Nothing assembled yet: the first viewer only hears the broadcast.
    let (mut first, _) = connect_async(&url).await.expect("ws connect");
    wait_for_sessions(&registry, 1).await;
    let report = registry.broadcast(snapshot(8_589_934_592));
    assert_eq!(report.delivered, 1);
    let v = next_json(&mut first).await;
    assert_eq!(v["version"], 1);
    assert_eq!(v["memory"]["total"], "8.00 GB");
    assert_eq!(v["memory"]["percentage"], "75.0");
    assert_eq!(v["cpu"][0]["usage"], 12.5);

    // A late viewer gets the latest snapshot without waiting for a tick.
    let (mut second, _) = connect_async(&url).await.expect("ws connect");
    let v = next_json(&mut second).await;
    assert_eq!(v["memory"]["total"], "8.00 GB");
    wait_for_sessions(&registry, 2).await;

    let report = registry.broadcast(snapshot(1024));
    assert_eq!(report.delivered, 2);
    assert_eq!(next_json(&mut first).await["memory"]["total"], "1.00 KB");
    assert_eq!(next_json(&mut second).await["memory"]["total"], "1.00 KB");

    // Leaving unregisters; the remaining viewer keeps receiving.
    drop(first);
    wait_for_sessions(&registry, 1).await;
    let report = registry.broadcast(snapshot(2048));
    assert_eq!(report.delivered, 1);
    assert_eq!(next_json(&mut second).await["memory"]["total"], "2.00 KB");
}

#[tokio::test]
async fn inbound_frames_are_ignored() {
    let registry = Arc::new(SessionRegistry::new());
    let addr = start(registry.clone()).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.expect("ws connect");
    wait_for_sessions(&registry, 1).await;

    ws.send(Message::Text("get_metrics".into())).await.expect("send");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.len(), 1);

    registry.broadcast(snapshot(4096));
    assert_eq!(next_json(&mut ws).await["memory"]["total"], "4.00 KB");
}

#[tokio::test]
async fn host_sampler_streams_real_snapshots() {
    let registry = Arc::new(SessionRegistry::new());
    let addr = start(registry.clone()).await;
    let cfg = AgentConfig::default();
    let assembler = host_assembler(&cfg);
    let cores = assembler.cores();
    let sampler = spawn_sampler(assembler, registry.clone(), Duration::from_millis(200));

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.expect("ws connect");
    let v = next_json(&mut ws).await;
    assert_eq!(v["cpu"].as_array().map(Vec::len), Some(cores));
    for core in v["cpu"].as_array().unwrap() {
        let usage = core["usage"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&usage));
    }
    assert!(v["memory"]["total"].as_str().is_some());
    assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(v["processes"].as_array().unwrap().len() <= 5);

    sampler.abort();
}
