//! Admin API over a real HTTP connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use visca_bridge::application::{CommandService, SerialLink};
use visca_bridge::domain::BridgeConfig;
use visca_bridge::infrastructure::admin_api::FALLBACK_INDEX;
use visca_bridge::infrastructure::serial::mock::MockSerialPort;
use visca_bridge::infrastructure::{AdminServer, AdminState, SerialTransport, SerialWorker};
use visca_core::{PresetTable, StatsSink};

struct Admin {
    addr: std::net::SocketAddr,
    mock: MockSerialPort,
    running: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
    worker: SerialWorker,
}

async fn start_admin(mock: MockSerialPort) -> Admin {
    let sink = Arc::new(StatsSink::new(50));
    let transport = SerialTransport::new(Box::new(mock.clone()), Arc::clone(&sink));
    let worker = SerialWorker::spawn(transport).unwrap();
    let link: Arc<dyn SerialLink> = Arc::new(worker.handle());
    let config = BridgeConfig::default();
    let running = Arc::new(AtomicBool::new(true));

    let state = AdminState {
        commands: Arc::new(CommandService::new(
            link,
            Arc::clone(&sink),
            config.response_timeout,
        )),
        sink,
        presets: Arc::new(PresetTable::builtin()),
        config: Arc::new(config),
        running: Arc::clone(&running),
        index_html: Arc::from(FALLBACK_INDEX),
    };

    let server = AdminServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = server.local_addr();
    let task = tokio::spawn(server.run(state));

    Admin {
        addr,
        mock,
        running,
        task,
        worker,
    }
}

impl Admin {
    /// Sends one HTTP/1.1 request and returns (status code, body).
    async fn request(&self, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let body = body.unwrap_or("");
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        timeout(Duration::from_secs(3), stream.read_to_string(&mut raw))
            .await
            .expect("admin server did not answer")
            .unwrap();

        let status = raw
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }

    async fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        timeout(Duration::from_secs(2), self.task)
            .await
            .expect("admin server did not stop")
            .unwrap()
            .unwrap();
        self.worker.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stats_endpoint_returns_status_json() {
    // Arrange
    let admin = start_admin(MockSerialPort::new()).await;

    // Act
    let (status, body) = admin.request("GET", "/api/stats", None).await;

    // Assert
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["run"], true);
    assert_eq!(json["ser"], true);
    assert_eq!(json["vport"], 52381);
    assert_eq!(json["baud"], 9600);
    assert!(json["log"].is_array());
    admin.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cmd_endpoint_round_trips_through_serial() {
    let mock = MockSerialPort::new();
    mock.reply_to(&[0x81, 0x01, 0x04, 0x07, 0x02, 0xFF], &[0x90, 0x41, 0xFF]);
    let admin = start_admin(mock).await;

    let (status, body) = admin
        .request("POST", "/api/cmd", Some(r#"{"hex":"81 01 04 07 02 FF"}"#))
        .await;

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["resp"], "9041ff");
    assert_eq!(admin.mock.writes().len(), 1);
    admin.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cmd_endpoint_rejects_bad_hex() {
    let admin = start_admin(MockSerialPort::new()).await;

    let (status, body) = admin.request("POST", "/api/cmd", Some(r#"{"hex":"zz"}"#)).await;

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["ok"], false);
    assert!(json["err"].as_str().unwrap().starts_with("InvalidInput"));
    assert!(admin.mock.writes().is_empty());
    admin.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_presets_endpoint_and_unknown_preset() {
    let admin = start_admin(MockSerialPort::new()).await;

    let (list_status, list_body) = admin.request("GET", "/api/presets", None).await;
    let (missing_status, _) = admin.request("POST", "/api/presets/nope", None).await;

    assert_eq!(list_status, 200);
    let json: serde_json::Value = serde_json::from_str(&list_body).unwrap();
    assert_eq!(json["pt_home"], "81010604FF");
    assert_eq!(missing_status, 404);
    admin.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_index_and_unknown_path() {
    let admin = start_admin(MockSerialPort::new()).await;

    let (index_status, index_body) = admin.request("GET", "/", None).await;
    let (missing_status, _) = admin.request("GET", "/nope", None).await;

    assert_eq!(index_status, 200);
    assert!(index_body.contains("VISCA Bridge"));
    assert_eq!(missing_status, 404);
    admin.stop().await;
}
