use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use messages_api::{MessagesApiClient, MessagesApiConfig, MessagesApiError, RequestMessage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

fn allow_local_integration() -> bool {
    std::env::var("MESSAGES_API_ALLOW_LOCAL_INTEGRATION")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

#[derive(Clone)]
enum ScriptedResponse {
    Respond { status: u16, body: String },
    Reset,
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            handle,
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn respond(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        body: body.to_owned(),
    }
}

fn client_for(server: &ScriptedServer) -> MessagesApiClient {
    let config = MessagesApiConfig::new("sk-local")
        .with_base_url(&server.base_url)
        .with_model("claude-test");
    MessagesApiClient::new(config).expect("client")
}

#[tokio::test]
async fn send_integration_returns_text_and_usage() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![respond(
        200,
        r#"{"id":"msg_1","model":"claude-test","content":[{"type":"text","text":"hello"}],"usage":{"input_tokens":7,"output_tokens":2}}"#,
    )])
    .await;
    let client = client_for(&server);
    let request = client.request_for("sys", vec![RequestMessage::new("user", "hi")]);

    let response = timeout(Duration::from_secs(5), client.send(&request))
        .await
        .expect("send should resolve")
        .expect("successful response");

    assert_eq!(response.text(), "hello");
    assert_eq!(response.usage.input_tokens, 7);
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn send_integration_surfaces_overloaded_status_without_retrying() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        respond(
            529,
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        ),
        respond(200, r#"{"content":[{"type":"text","text":"late"}]}"#),
    ])
    .await;
    let client = client_for(&server);
    let request = client.request_for("", vec![RequestMessage::new("user", "hi")]);

    let error = timeout(Duration::from_secs(5), client.send(&request))
        .await
        .expect("send should resolve")
        .expect_err("529 should fail");

    assert_eq!(error.status(), Some(529));
    assert_eq!(error.message(), "overloaded_error: Overloaded");
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn send_integration_connection_reset_has_no_status() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![ScriptedResponse::Reset]).await;
    let client = client_for(&server);
    let request = client.request_for("", vec![RequestMessage::new("user", "hi")]);

    let error = timeout(Duration::from_secs(5), client.send(&request))
        .await
        .expect("send should resolve")
        .expect_err("reset should fail");

    assert!(matches!(error, MessagesApiError::Request(_)));
    assert_eq!(error.status(), None);
    server.shutdown();
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        429 => "Too Many Requests",
        503 => "Service Unavailable",
        529 => "Overloaded",
        _ => "Error",
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
) {
    if read_request_headers(&mut socket).await.is_err() {
        return;
    }

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| respond(500, r#"{"error":{"message":"unexpected request"}}"#));

    match response {
        ScriptedResponse::Reset => {}
        ScriptedResponse::Respond { status, body } => {
            let head = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_reason(status),
                body.len(),
            );
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }
}

async fn read_request_headers(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 2048];

    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..n]);
        if request.windows(4).any(|window| window == b"\r\n\r\n") {
            return Ok(());
        }
    }
}
