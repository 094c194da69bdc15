//! End-to-end tests of the WebSocket endpoint over a real TCP socket.
//!
//! The client side speaks just enough RFC 6455 to perform the upgrade,
//! read unmasked server text frames and send masked client text frames.

mod helpers;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use uuid::Uuid;

use socialhub_auth::session::LoginMetadata;
use socialhub_entity::notification::NotificationType;
use socialhub_realtime::ws;

use helpers::TestApp;

const WS_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

struct Client {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr, query: &str) -> (Self, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET /ws?{query} HTTP/1.1\r\n\
             Host: {addr}\r\n\
             Connection: Upgrade\r\n\
             Upgrade: websocket\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: {WS_KEY}\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut client = Self {
            stream,
            buf: Vec::new(),
        };
        let head = client.read_head().await;
        (client, head)
    }

    async fn fill(&mut self) {
        let mut chunk = [0u8; 4096];
        let n = timeout(Duration::from_secs(5), self.stream.read(&mut chunk))
            .await
            .expect("timed out reading socket")
            .unwrap();
        assert!(n > 0, "socket closed");
        self.buf.extend_from_slice(&chunk[..n]);
    }

    async fn read_head(&mut self) -> String {
        loop {
            if let Some(pos) = self.buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head: Vec<u8> = self.buf.drain(..pos + 4).collect();
                return String::from_utf8_lossy(&head).into_owned();
            }
            self.fill().await;
        }
    }

    /// Next text frame payload, skipping control frames.
    async fn read_text(&mut self) -> serde_json::Value {
        loop {
            while self.buf.len() < 2 {
                self.fill().await;
            }
            let opcode = self.buf[0] & 0x0f;
            let (len, header) = match self.buf[1] & 0x7f {
                126 => {
                    while self.buf.len() < 4 {
                        self.fill().await;
                    }
                    (u16::from_be_bytes([self.buf[2], self.buf[3]]) as usize, 4)
                }
                127 => panic!("frame too large for test client"),
                n => (n as usize, 2),
            };
            while self.buf.len() < header + len {
                self.fill().await;
            }
            let frame: Vec<u8> = self.buf.drain(..header + len).collect();
            if opcode == 0x1 {
                return serde_json::from_slice(&frame[header..]).unwrap();
            }
        }
    }

    async fn send_text(&mut self, text: &str) {
        let payload = text.as_bytes();
        assert!(payload.len() < 126);
        let mask = [0x12u8, 0x34, 0x56, 0x78];
        let mut frame = vec![0x81, 0x80 | payload.len() as u8];
        frame.extend_from_slice(&mask);
        frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
        self.stream.write_all(&frame).await.unwrap();
    }
}

async fn serve(app: &TestApp) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = ws::router(app.ws_state());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

#[tokio::test]
async fn test_rejects_invalid_token() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    let (_client, head) = Client::connect(addr, "token=not-a-token&device_id=phone").await;
    assert!(head.starts_with("HTTP/1.1 401"), "{head}");
}

#[tokio::test]
async fn test_rejects_token_for_other_device() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let tokens = app
        .sessions
        .login(Uuid::new_v4(), LoginMetadata::new("phone"))
        .await
        .unwrap();

    let query = format!("token={}&device_id=laptop", tokens.access_token);
    let (_client, head) = Client::connect(addr, &query).await;
    assert!(head.starts_with("HTTP/1.1 401"), "{head}");
}

#[tokio::test]
async fn test_delivers_notifications_and_answers_frames() {
    let mut app = TestApp::new();
    app.start_dispatcher();
    let addr = serve(&app).await;
    let user = Uuid::new_v4();
    let tokens = app
        .sessions
        .login(user, LoginMetadata::new("phone"))
        .await
        .unwrap();

    let query = format!("token={}&device_id=phone", tokens.access_token);
    let (mut client, head) = Client::connect(addr, &query).await;
    assert!(head.starts_with("HTTP/1.1 101"), "{head}");

    let created = app
        .notifications
        .notify(user, None, NotificationType::PostComment, serde_json::json!({ "post_id": 7 }))
        .await
        .unwrap();

    let frame = client.read_text().await;
    assert_eq!(frame["type"], "notification");
    assert_eq!(frame["id"], created.id.to_string());
    assert_eq!(frame["data"]["post_id"], 7);

    client.send_text(r#"{"type":"ping","timestamp":5}"#).await;
    let pong = client.read_text().await;
    assert_eq!(pong["type"], "pong");
    assert_eq!(pong["timestamp"], 5);

    let mark = format!(r#"{{"type":"mark_read","notification_id":"{}"}}"#, created.id);
    client.send_text(&mark).await;
    let unread = client.read_text().await;
    assert_eq!(unread["type"], "unread_count");
    assert_eq!(unread["count"], 0);

    app.shutdown();
}
