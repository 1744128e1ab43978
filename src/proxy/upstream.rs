//! Upstream connection and request forwarding
//!
//! Each exchange opens a fresh connection, sends one request with
//! `Connection: close` and reads one response. No pooling and no retries.

use std::collections::HashMap;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::UpstreamError;
use crate::http::parser::{
    decode_chunked, find_headers_end, header_value, parse_header_lines, ParseError,
    MAX_HEADER_BYTES,
};
use crate::http::request::Request;
use crate::proxy::backend::Backend;

/// Default buffer size for reads
const BUFFER_SIZE: usize = 8192;

/// Responses larger than this are rejected rather than buffered.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "Connection",
    "Keep-Alive",
    "Proxy-Connection",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "TE",
    "Transfer-Encoding",
    "Upgrade",
];

/// A response as received from the backend.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the configured backend.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    backend: Backend,

    /// Connection timeout duration
    connection_timeout: Duration,

    /// Time allowed for writing the request and reading the whole response
    request_timeout: Duration,
}

impl ProxyHandler {
    pub fn new(backend: Backend, connection_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            backend,
            connection_timeout,
            request_timeout,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Performs exactly one request/response exchange with the backend.
    ///
    /// Any status the backend sends comes back as `Ok`; deciding what a
    /// non-2xx answer means is up to the caller.
    pub async fn fetch(&self, request: &Request) -> Result<UpstreamResponse, UpstreamError> {
        let addr = self.backend.address();

        let stream = match timeout(self.connection_timeout, TcpStream::connect(&addr)).await {
            Err(_) => {
                return Err(UpstreamError::ConnectTimeout {
                    addr,
                    after: self.connection_timeout,
                });
            }
            Ok(Err(source)) => return Err(UpstreamError::Connect { addr, source }),
            Ok(Ok(stream)) => stream,
        };

        tracing::trace!(backend = self.backend.display_name(), "Connected to backend");

        timeout(
            self.request_timeout,
            self.send_request_and_receive_response(stream, request),
        )
        .await
        .map_err(|_| UpstreamError::ResponseTimeout(self.request_timeout))?
    }

    async fn send_request_and_receive_response(
        &self,
        mut stream: TcpStream,
        request: &Request,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let request_bytes = self.build_http_request(request);
        stream.write_all(&request_bytes).await?;
        stream.flush().await?;

        tracing::trace!("Request sent to backend");

        read_http_response(&mut stream).await
    }

    /// Serializes `request` for this handler's backend.
    ///
    /// `Host` is rewritten to the backend, hop-by-hop headers are dropped and
    /// `Connection: close` is forced.
    pub fn build_http_request(&self, request: &Request) -> Vec<u8> {
        let mut buffer = Vec::new();

        let path = if request.path.is_empty() {
            "/"
        } else {
            &request.path
        };

        buffer.extend_from_slice(
            format!("{} {} {}\r\n", request.method, path, request.version).as_bytes(),
        );

        let mut headers: Vec<(&str, String)> = request
            .headers
            .iter()
            .filter(|(k, _)| {
                !k.eq_ignore_ascii_case("Host")
                    && !k.eq_ignore_ascii_case("Content-Length")
                    && !HOP_BY_HOP.iter().any(|h| k.eq_ignore_ascii_case(h))
            })
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        headers.push(("Host", self.backend.host_header()));
        headers.push(("Connection", "close".to_string()));
        if !request.body.is_empty() {
            headers.push(("Content-Length", request.body.len().to_string()));
        }
        headers.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in &headers {
            buffer.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
        }

        buffer.extend_from_slice(b"\r\n");
        buffer.extend_from_slice(&request.body);

        buffer
    }
}

/// Reads one HTTP/1.x response. Interim 1xx responses are skipped.
async fn read_http_response(stream: &mut TcpStream) -> Result<UpstreamResponse, UpstreamError> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        let headers_end = loop {
            if let Some(end) = find_headers_end(&buffer) {
                break end;
            }
            if buffer.len() > MAX_HEADER_BYTES {
                return Err(UpstreamError::Malformed("response headers too large".into()));
            }
            if stream.read_buf(&mut buffer).await? == 0 {
                return Err(UpstreamError::Malformed(
                    "connection closed before complete response received".into(),
                ));
            }
        };

        let header_bytes = buffer.split_to(headers_end + 4);
        let (status, headers) = parse_response_head(&header_bytes[..headers_end])?;

        if (100..200).contains(&status) {
            continue;
        }

        let body = read_response_body(stream, &mut buffer, status, &headers).await?;
        return Ok(UpstreamResponse {
            status,
            headers,
            body,
        });
    }
}

/// Parses the status line and headers of a response.
pub fn parse_response_head(
    head: &[u8],
) -> Result<(u16, HashMap<String, String>), UpstreamError> {
    let head = std::str::from_utf8(head)
        .map_err(|_| UpstreamError::Malformed("invalid UTF-8 in response headers".into()))?;

    let mut lines = head.split("\r\n");
    let status_line = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| UpstreamError::Malformed("empty response".into()))?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(UpstreamError::Malformed(format!(
            "invalid status line: {}",
            status_line
        )));
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..600).contains(code))
        .ok_or_else(|| UpstreamError::Malformed(format!("invalid status line: {}", status_line)))?;

    let headers = parse_header_lines(lines)
        .map_err(|_| UpstreamError::Malformed("invalid response header".into()))?;

    Ok((status, headers))
}

async fn read_response_body(
    stream: &mut TcpStream,
    buffer: &mut BytesMut,
    status: u16,
    headers: &HashMap<String, String>,
) -> Result<Vec<u8>, UpstreamError> {
    if status == 204 || status == 304 {
        return Ok(Vec::new());
    }

    let chunked = header_value(headers, "Transfer-Encoding")
        .map(|te| te.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);

    if chunked {
        loop {
            match decode_chunked(buffer) {
                Ok((body, _)) => return Ok(body),
                Err(ParseError::Incomplete) => {}
                Err(_) => return Err(UpstreamError::Malformed("invalid chunked body".into())),
            }
            fill(stream, buffer, "connection closed inside chunked body").await?;
        }
    }

    if let Some(cl) = header_value(headers, "Content-Length") {
        let content_length: usize = cl
            .parse()
            .map_err(|_| UpstreamError::Malformed(format!("invalid Content-Length: {}", cl)))?;
        if content_length > MAX_BODY_BYTES {
            return Err(UpstreamError::Malformed("response body too large".into()));
        }
        while buffer.len() < content_length {
            fill(stream, buffer, "connection closed before complete body received").await?;
        }
        return Ok(buffer.split_to(content_length).to_vec());
    }

    // No framing: the body runs until the backend closes
    while stream.read_buf(buffer).await? != 0 {
        if buffer.len() > MAX_BODY_BYTES {
            return Err(UpstreamError::Malformed("response body too large".into()));
        }
    }
    Ok(buffer.split().to_vec())
}

async fn fill(
    stream: &mut TcpStream,
    buffer: &mut BytesMut,
    eof_message: &str,
) -> Result<(), UpstreamError> {
    if buffer.len() > MAX_BODY_BYTES {
        return Err(UpstreamError::Malformed("response body too large".into()));
    }
    if stream.read_buf(buffer).await? == 0 {
        return Err(UpstreamError::Malformed(eof_message.to_string()));
    }
    Ok(())
}
