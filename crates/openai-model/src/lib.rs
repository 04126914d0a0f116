//! A model provider for OpenAI-compatible chat-completion APIs.
//!
//! Any server exposing the `/chat/completions` streaming endpoint works,
//! including local servers hosting open-weight chat models.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use persona_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let mut req_builder = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream");
        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder
                .header(header::AUTHORIZATION, format!("Bearer {api_key}"));
        }
        let resp_fut = req_builder.json(&openai_req).send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                let kind = if err.is_connect() || err.is_timeout() {
                    ErrorKind::Unavailable
                } else {
                    ErrorKind::Other
                };
                Error::new(format!("{err}"), kind)
            })?;

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::new(
                    format!("Unexpected status: {status}"),
                    status_error_kind(status),
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}

fn status_error_kind(status: StatusCode) -> ErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorKind::RateLimitExceeded
    } else if status.is_server_error() {
        ErrorKind::Unavailable
    } else {
        ErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use persona_chat_model::{
        ModelMessage, ModelResponse, ModelResponseEvent, SamplingParams,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![
                ModelMessage::System("You are a human.".to_owned()),
                ModelMessage::User("Hi".to_owned()),
            ],
            sampling: SamplingParams::default(),
        }
    }

    /// Serves `response` to a single connection, returning the base URL and
    /// a handle yielding the raw request that was received.
    async fn serve_once(response: Vec<u8>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_ascii_lowercase();
                let Some(head_end) = text.find("\r\n\r\n") else {
                    assert!(n > 0, "connection closed mid-request");
                    continue;
                };
                let body_len = text[..head_end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|len| len.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + body_len || n == 0 {
                    break;
                }
            }
            stream.write_all(&response).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(raw).unwrap()
        });
        (base_url, handle)
    }

    fn http_response(content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: {content_type}\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    #[tokio::test]
    async fn test_event_stream() {
        let body = include_bytes!("../fixtures/test_response.txt");
        let (base_url, server) =
            serve_once(http_response("text/event-stream", body)).await;
        let provider = OpenAIProvider::new(
            OpenAIConfigBuilder::with_api_key("sk-test")
                .with_base_url(base_url)
                .build(),
        );

        let resp = provider.send_request(&request()).await.unwrap();
        let mut resp = pin!(resp);
        let mut text = String::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            if let ModelResponseEvent::MessageDelta(delta) = event {
                text.push_str(&delta);
            }
        }
        assert_eq!(text, "hey! did you see the new phone?");

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /v1/chat/completions "));
        assert!(
            raw_request
                .to_ascii_lowercase()
                .contains("authorization: bearer sk-test\r\n")
        );
    }

    #[tokio::test]
    async fn test_unexpected_content_type() {
        let (base_url, server) =
            serve_once(http_response("application/json", b"{}")).await;
        let provider = OpenAIProvider::new(
            OpenAIConfigBuilder::without_api_key()
                .with_base_url(base_url)
                .build(),
        );

        let err = provider.send_request(&request()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);

        let raw_request = server.await.unwrap();
        assert!(!raw_request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on the discard port.
        let provider = OpenAIProvider::new(
            OpenAIConfigBuilder::without_api_key()
                .with_base_url("http://127.0.0.1:9/v1")
                .build(),
        );
        let err = provider.send_request(&request()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_status_error_kind() {
        assert_eq!(
            status_error_kind(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            status_error_kind(StatusCode::SERVICE_UNAVAILABLE),
            ErrorKind::Unavailable
        );
        assert_eq!(
            status_error_kind(StatusCode::BAD_REQUEST),
            ErrorKind::Other
        );
    }
}
