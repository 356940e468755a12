//! Test helpers for integration tests
//!
//! A scripted gateway server: each test accepts the client's sockets one by
//! one and plays the server side of the conversation by hand.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use echord_common::{try_init_tracing_with_config, TracingConfig};
use echord_gateway::GatewayEvent;
use flate2::{Compress, Compression, FlushCompress};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

/// Upper bound for any single step of a test
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Route client logs to the test output; later calls are no-ops
pub fn init_test_tracing() {
    let config = TracingConfig::development().with_default_directive("warn,echord_gateway=debug");
    let _ = try_init_tracing_with_config(config);
}

/// Gateway server bound to an ephemeral local port
pub struct MockGateway {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockGateway {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Accept the next client socket
    pub async fn accept(&self) -> Result<MockConnection> {
        let (stream, _) = tokio::time::timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .context("no client connected")??;

        let mut request_uri = String::new();
        let record_uri = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            request_uri = request.uri().to_string();
            Ok(response)
        };
        let socket = accept_hdr_async(stream, record_uri).await?;

        Ok(MockConnection {
            socket,
            request_uri,
            compress: None,
        })
    }
}

/// Server side of one accepted socket
pub struct MockConnection {
    socket: WebSocketStream<TcpStream>,
    request_uri: String,
    compress: Option<Compress>,
}

impl MockConnection {
    /// Path and query the client connected with
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// Send every following payload as a zlib-stream binary frame
    pub fn enable_compression(&mut self) {
        self.compress = Some(Compress::new(Compression::default(), true));
    }

    pub async fn send(&mut self, payload: Value) -> Result<()> {
        let json = serde_json::to_string(&payload)?;
        let message = match self.compress.as_mut() {
            Some(compress) => Message::Binary(deflate_sync(compress, json.as_bytes())?),
            None => Message::Text(json),
        };
        self.socket.send(message).await?;
        Ok(())
    }

    /// Next frame from the client, decoded as JSON
    pub async fn recv(&mut self) -> Result<Value> {
        loop {
            let message = tokio::time::timeout(STEP_TIMEOUT, self.socket.next())
                .await
                .context("client sent nothing")?
                .ok_or_else(|| anyhow!("client disconnected"))??;

            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => bail!("client closed the socket: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// Next frame with op code `op`, skipping anything else (heartbeats)
    pub async fn recv_op(&mut self, op: u64) -> Result<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["op"].as_u64() == Some(op) {
                return Ok(frame);
            }
        }
    }

    /// Wait for the client's close frame and return its code
    ///
    /// `None` if the socket ended without one.
    pub async fn recv_close(&mut self) -> Result<Option<u16>> {
        loop {
            let next = tokio::time::timeout(STEP_TIMEOUT, self.socket.next())
                .await
                .context("client never closed")?;

            match next {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close from the server side
    pub async fn close(mut self, code: u16, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.socket.send(Message::Close(Some(frame))).await?;
        Ok(())
    }
}

/// Compress one payload with a sync flush, continuing the shared stream
pub fn deflate_sync(compress: &mut Compress, input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() + 1024);
    compress.compress_vec(input, &mut out, FlushCompress::Sync)?;
    Ok(out)
}

/// Next event from the client, failing the test after [`STEP_TIMEOUT`]
pub async fn next_event(events: &mut UnboundedReceiver<GatewayEvent>) -> Result<GatewayEvent> {
    tokio::time::timeout(STEP_TIMEOUT, events.recv())
        .await
        .context("no event received")?
        .ok_or_else(|| anyhow!("event stream ended"))
}

/// Skip events until one matches
pub async fn wait_for_event<F>(
    events: &mut UnboundedReceiver<GatewayEvent>,
    mut matches: F,
) -> Result<GatewayEvent>
where
    F: FnMut(&GatewayEvent) -> bool,
{
    loop {
        let event = next_event(events).await?;
        if matches(&event) {
            return Ok(event);
        }
    }
}

/// Wait for the event stream to end
pub async fn wait_for_end(events: &mut UnboundedReceiver<GatewayEvent>) -> Result<Vec<GatewayEvent>> {
    let mut rest = Vec::new();
    loop {
        match tokio::time::timeout(STEP_TIMEOUT, events.recv()).await {
            Ok(Some(event)) => rest.push(event),
            Ok(None) => return Ok(rest),
            Err(_) => bail!("event stream never ended"),
        }
    }
}
