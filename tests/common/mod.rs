//! Common test utilities and fixtures.

#![allow(dead_code)]

use meterbar_lib::core::config::ServerConfig;
use meterbar_lib::receiver::{OtlpReceiver, SharedStore};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Response every completed request receives.
pub const EXPECTED_RESPONSE: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}";

/// Builder for a single OTLP/JSON `sum` metric data point.
pub struct TestPointBuilder {
    name: String,
    value: Value,
    attributes: Vec<(String, String)>,
}

impl TestPointBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: json!({ "asInt": "0" }),
            attributes: Vec::new(),
        }
    }

    /// Integer value encoded as a decimal string, as exporters send it.
    pub fn int(mut self, value: i64) -> Self {
        self.value = json!({ "asInt": value.to_string() });
        self
    }

    pub fn double(mut self, value: f64) -> Self {
        self.value = json!({ "asDouble": value });
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Value {
        let mut data_point = self.value;
        data_point["attributes"] = self
            .attributes
            .into_iter()
            .map(|(key, value)| json!({ "key": key, "value": { "stringValue": value } }))
            .collect();

        json!({ "name": self.name, "sum": { "dataPoints": [data_point] } })
    }
}

/// Wrap metrics in the `resourceMetrics/scopeMetrics` envelope.
pub fn export_body(metrics: Vec<Value>) -> String {
    json!({
        "resourceMetrics": [{
            "resource": { "attributes": [
                { "key": "service.name", "value": { "stringValue": "claude-code" } }
            ] },
            "scopeMetrics": [{
                "scope": { "name": "com.anthropic.claude_code" },
                "metrics": metrics
            }]
        }]
    })
    .to_string()
}

/// Export body with input/output token counts.
pub fn token_body(input: i64, output: i64) -> String {
    export_body(vec![
        TestPointBuilder::new("claude_code.token.usage")
            .int(input)
            .attr("type", "input")
            .attr("model", "claude-sonnet")
            .build(),
        TestPointBuilder::new("claude_code.token.usage")
            .int(output)
            .attr("type", "output")
            .attr("model", "claude-sonnet")
            .build(),
    ])
}

/// Full raw HTTP request bytes.
pub fn http_request(method: &str, path: &str, body: &str) -> String {
    format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    )
}

/// Start a receiver on an ephemeral loopback port.
pub async fn start_receiver() -> (SocketAddr, Arc<OtlpReceiver>) {
    let config = ServerConfig {
        http_port: 0,
        ..ServerConfig::default()
    };
    let receiver = Arc::new(OtlpReceiver::new(&config, SharedStore::default()));
    let listener = receiver.bind().await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(Arc::clone(&receiver).serve(listener));
    (addr, receiver)
}

/// Send `chunks` with a pause between them and read the reply to EOF.
pub async fn send_chunked(addr: SocketAddr, chunks: &[&[u8]], pause: Duration) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    for chunk in chunks {
        stream.write_all(chunk).await.expect("write chunk");
        stream.flush().await.expect("flush");
        tokio::time::sleep(pause).await;
    }
    read_to_end(&mut stream).await
}

/// Send one complete request and read the reply.
pub async fn send_raw(addr: SocketAddr, request: &str) -> String {
    send_chunked(addr, &[request.as_bytes()], Duration::ZERO).await
}

pub async fn read_to_end(stream: &mut TcpStream) -> String {
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("response within timeout")
        .expect("read response");
    String::from_utf8(response).expect("utf-8 response")
}

/// Poll until `check` holds or a second has passed.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
