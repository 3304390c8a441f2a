//! Minimal HTTP/1.1 request framing for the OTLP receiver.
//!
//! Bytes are accumulated per connection until the header terminator has
//! arrived and the body is as long as its `Content-Length`. One request is
//! served per connection; there is no keep-alive, pipelining or chunked
//! transfer-encoding.

use bytes::{Bytes, BytesMut};

/// Sequence separating the header block from the body.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// OTLP/HTTP path for metrics exports.
pub const METRICS_PATH: &str = "/v1/metrics";

/// Fixed reply sent for every completed request, whatever its content.
pub const OTLP_SUCCESS_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: application/json\r\n\
Content-Length: 2\r\n\
Connection: close\r\n\
\r\n\
{}";

/// A fully received request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Bytes,
}

impl HttpRequest {
    /// True for `POST /v1/metrics`, the only request whose body is decoded.
    pub fn is_metrics_export(&self) -> bool {
        self.method == "POST" && self.path == METRICS_PATH
    }
}

/// Accumulates connection bytes until one complete request is available.
#[derive(Debug, Default)]
pub struct RequestFramer {
    buffer: BytesMut,
}

impl RequestFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and try to frame a request from everything received.
    pub fn push(&mut self, chunk: &[u8]) -> Option<HttpRequest> {
        self.buffer.extend_from_slice(chunk);
        self.try_parse()
    }

    /// Number of bytes received so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Frame a request from the buffered bytes, or `None` if more are needed.
    ///
    /// A malformed header block is indistinguishable from an incomplete one:
    /// both keep waiting until the peer closes the connection.
    pub fn try_parse(&self) -> Option<HttpRequest> {
        let header_end = find_subsequence(&self.buffer, HEADER_TERMINATOR)?;
        let header = std::str::from_utf8(&self.buffer[..header_end]).ok()?;

        let mut lines = header.split("\r\n");
        let mut request_line = lines.next()?.split(' ');
        let method = request_line.next()?;
        let path = request_line.next()?;

        let content_length = content_length(lines);
        let body_start = header_end + HEADER_TERMINATOR.len();
        let body_end = body_start.checked_add(content_length)?;
        if self.buffer.len() < body_end {
            return None;
        }

        Some(HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: Bytes::copy_from_slice(&self.buffer[body_start..body_end]),
        })
    }
}

/// Value of the first `Content-Length` header, 0 when absent or unparseable.
fn content_length<'a>(mut header_lines: impl Iterator<Item = &'a str>) -> usize {
    const NAME: &str = "content-length:";

    header_lines
        .find(|line| {
            line.get(..NAME.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(NAME))
        })
        .and_then(|line| line[NAME.len()..].trim().parse().ok())
        .unwrap_or(0)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
