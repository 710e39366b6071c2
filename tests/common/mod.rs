//! Shared doubles for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use infisical_config::config::Credentials;
use infisical_config::{BackendError, RepositoryOptions, SecretEntry, SecretsBackendClient, Session};

pub const PROJECT: &str = "projectId";

/// Options accepted by validation, pointing at a backend that is never dialed.
pub fn options() -> RepositoryOptions {
    RepositoryOptions::new()
        .with_site_url("https://secrets.example.com")
        .with_project_id(PROJECT)
        .with_client_credentials("clientId", "clientSecret")
}

#[derive(Default)]
struct Script {
    secrets: BTreeMap<String, String>,
    transient_failures: u32,
    always_fail: bool,
    hang: bool,
    reject_login: bool,
}

/// Backend whose behavior tests change while a provider runs against it.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
    logins: AtomicU32,
    listings: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_secrets(pairs: &[(&str, &str)]) -> Arc<Self> {
        let backend = Self::new();
        backend.replace(pairs);
        backend
    }

    /// Replace the whole secret set.
    pub fn replace(&self, pairs: &[(&str, &str)]) {
        let mut script = self.script.lock().unwrap();
        script.secrets = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut script = self.script.lock().unwrap();
        script.secrets.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.script.lock().unwrap().secrets.remove(key);
    }

    /// Fail the next `count` listings with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.script.lock().unwrap().transient_failures = count;
    }

    /// Fail every listing with a transport error until cleared.
    pub fn fail_always(&self, enabled: bool) {
        self.script.lock().unwrap().always_fail = enabled;
    }

    /// Never answer listings.
    pub fn hang(&self, enabled: bool) {
        self.script.lock().unwrap().hang = enabled;
    }

    pub fn reject_login(&self, enabled: bool) {
        self.script.lock().unwrap().reject_login = enabled;
    }

    pub fn logins(&self) -> u32 {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn listings(&self) -> u32 {
        self.listings.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Serve(Vec<SecretEntry>),
    Fail,
    Hang,
}

#[async_trait]
impl SecretsBackendClient for ScriptedBackend {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Session, BackendError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.script.lock().unwrap().reject_login {
            return Err(BackendError::Unauthorized("invalid client secret".into()));
        }
        Ok(Session::new("scripted", None))
    }

    async fn list_secrets(
        &self,
        _session: &Session,
        _project_id: &str,
        _environment: &str,
    ) -> Result<Vec<SecretEntry>, BackendError> {
        self.listings.fetch_add(1, Ordering::SeqCst);

        let outcome = {
            let mut script = self.script.lock().unwrap();
            if script.hang {
                Outcome::Hang
            } else if script.always_fail {
                Outcome::Fail
            } else if script.transient_failures > 0 {
                script.transient_failures -= 1;
                Outcome::Fail
            } else {
                Outcome::Serve(
                    script
                        .secrets
                        .iter()
                        .map(|(k, v)| SecretEntry::new(k.clone(), v.clone()))
                        .collect(),
                )
            }
        };

        match outcome {
            Outcome::Serve(entries) => Ok(entries),
            Outcome::Fail => Err(BackendError::Transport("connection refused".into())),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query string.
    pub target: String,
    /// Header names lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A programmable HTTP server on an ephemeral port.
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path() == path).count()
    }
}

/// Start a server that answers every request with `handler(request)`.
pub async fn start_programmable_backend<F>(handler: F) -> MockServer
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let _ = serve_one(socket, handler.as_ref(), &recorded).await;
            });
        }
    });

    MockServer { addr, requests }
}

async fn serve_one<F>(
    mut socket: TcpStream,
    handler: &F,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()>
where
    F: Fn(&RecordedRequest) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let request = RecordedRequest {
        method,
        target,
        headers,
        body,
    };
    let (status, response_body) = handler(&request);
    recorded.lock().unwrap().push(request);

    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        response_body.len(),
        response_body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// Listing body in the backend's wire format.
pub fn secrets_json(pairs: &[(&str, &str)]) -> String {
    let secrets: Vec<_> = pairs
        .iter()
        .map(|(k, v)| serde_json::json!({ "secretKey": k, "secretValue": v }))
        .collect();
    serde_json::json!({ "secrets": secrets }).to_string()
}
