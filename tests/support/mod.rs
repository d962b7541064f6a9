#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use youdu_client::{Codec, YouduClient, YouduConfig};

pub const KEY_B64: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
pub const APP_ID: &str = "sys00000000000000001";
pub const BUIN: i64 = 14001;

pub fn codec() -> Codec {
    Codec::new(APP_ID, KEY_B64).expect("test key is valid")
}

pub fn client_for(server: &ScriptedServer) -> YouduClient {
    YouduClient::new(YouduConfig::new(&server.base_url, BUIN, APP_ID, KEY_B64)).expect("client")
}

#[derive(Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub delay_ms: u64,
}

impl ScriptedResponse {
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

pub fn response_json(status: u16, body: Value) -> ScriptedResponse {
    ScriptedResponse {
        status,
        content_type: "application/json",
        body: serde_json::to_vec(&body).expect("serialize response"),
        delay_ms: 0,
    }
}

pub fn response_bytes(content_type: &'static str, body: impl Into<Vec<u8>>) -> ScriptedResponse {
    ScriptedResponse {
        status: 200,
        content_type,
        body: body.into(),
        delay_ms: 0,
    }
}

/// Successful response whose `encrypt` field carries `plaintext`.
pub fn response_encrypted(plaintext: &str) -> ScriptedResponse {
    let encrypt = codec().encrypt(plaintext).expect("encrypt response");
    response_json(200, json!({"errcode": 0, "errmsg": "ok", "encrypt": encrypt}))
}

pub fn token_response(token: &str, expire_in: u64) -> ScriptedResponse {
    response_encrypted(&json!({"accessToken": token, "expireIn": expire_in}).to_string())
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self, key: &str) -> Option<String> {
        let (_, query) = self.target.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    /// Content of a multipart form field, without its part headers.
    pub fn form_field(&self, name: &str) -> Option<Vec<u8>> {
        self.form_part(name).map(|(_, content)| content)
    }

    pub fn form_header_block(&self, name: &str) -> Option<String> {
        self.form_part(name).map(|(headers, _)| headers)
    }

    /// Headers and content of the multipart part named `name`.
    fn form_part(&self, name: &str) -> Option<(String, Vec<u8>)> {
        let content_type = self.header("content-type")?;
        let boundary = content_type.split("boundary=").nth(1)?.trim_matches('"');
        let delimiter = format!("--{boundary}");
        let marker = format!("name=\"{name}\"");

        split_bytes(&self.body, delimiter.as_bytes())
            .into_iter()
            .find_map(|part| {
                let header_end = find_bytes(part, b"\r\n\r\n")?;
                let headers = String::from_utf8_lossy(&part[..header_end]).into_owned();
                if !headers.contains(&marker) {
                    return None;
                }
                let content = &part[header_end + 4..];
                let content = content.strip_suffix(b"\r\n").unwrap_or(content);
                Some((headers, content.to_vec()))
            })
    }
}

pub struct ScriptedServer {
    pub base_url: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
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
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, requests).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            requests,
            handle,
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Error",
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Ok(Some(request)) = read_request(&mut socket).await else {
        return;
    };

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    requests.lock().expect("requests lock").push(request);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| response_json(500, json!({"errcode": -1, "errmsg": "unexpected request"})));

    if response.delay_ms > 0 {
        sleep(Duration::from_millis(response.delay_ms)).await;
    }

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        status_reason(response.status),
        response.content_type,
        response.body.len(),
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(None);
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(position) = find_bytes(&raw, b"\r\n\r\n") {
            break position;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_owned();
    let target = request_line.next().unwrap_or_default().to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = raw[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
    }

    Ok(Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    }))
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_bytes<'a>(haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(position) = find_bytes(rest, delimiter) {
        parts.push(&rest[..position]);
        rest = &rest[position + delimiter.len()..];
    }
    parts.push(rest);
    parts
}
