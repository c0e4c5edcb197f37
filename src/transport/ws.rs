//! WebSocket transport implementation.
//!
//! Connects to the TV's secure remote-control channel with
//! `tokio-tungstenite`. Samsung TVs present a self-signed certificate on
//! the wss endpoint, so the TLS connector accepts invalid certificates and
//! hostnames; the channel carries no secrets beyond the pairing token the
//! TV itself issued.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector as TlsConnector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connector, FrameSink, FrameStream};

// ============================================================================
// Types
// ============================================================================

type WsStreamInner = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsConnector
// ============================================================================

/// Connector dialing the TV over (tls-wrapped) WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    /// Upper bound on a single connect attempt.
    connect_timeout: Duration,
}

impl WsConnector {
    /// Creates a connector with the given connect timeout.
    #[inline]
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Builds the permissive TLS connector for the TV's self-signed cert.
    fn tls_connector() -> Result<TlsConnector> {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| Error::connection(format!("TLS setup failed: {e}")))?;
        Ok(TlsConnector::NativeTls(tls))
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>)> {
        debug!(%url, "Opening WebSocket connection");

        let connector = Self::tls_connector()?;
        let attempt = tokio_tungstenite::connect_async_tls_with_config(
            url.as_str(),
            None,
            false,
            Some(connector),
        );

        let (stream, response) = timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| Error::connection_timeout(self.connect_timeout.as_millis() as u64))??;

        debug!(status = %response.status(), "WebSocket connection established");

        let (write, read) = stream.split();
        Ok((Box::new(WsSink { write }), Box::new(WsFrames { read })))
    }
}

// ============================================================================
// WsSink
// ============================================================================

/// Write half of the WebSocket connection.
struct WsSink {
    write: SplitSink<WsStreamInner, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<()> {
        trace!(len = frame.len(), "Sending frame");
        self.write.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.write.close().await;
    }
}

// ============================================================================
// WsFrames
// ============================================================================

/// Read half of the WebSocket connection.
struct WsFrames {
    read: SplitStream<WsStreamInner>,
}

#[async_trait]
impl FrameStream for WsFrames {
    async fn next(&mut self) -> Option<Result<String>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return None;
                }

                // Ignore Binary, Ping, Pong, Frame
                Some(Ok(other)) => {
                    trace!(kind = ?other, "Skipping non-text frame");
                }

                Some(Err(e)) => return Some(Err(e.into())),

                None => return None,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    /// One-shot echo server accepting a single WebSocket connection.
    async fn spawn_echo_server() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake");
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() && ws.send(msg).await.is_err() {
                    break;
                }
            }
        });

        Url::parse(&format!("ws://{addr}/")).expect("url")
    }

    #[tokio::test]
    async fn test_connect_send_receive() {
        let url = spawn_echo_server().await;
        let connector = WsConnector::new(Duration::from_secs(5));

        let (mut sink, mut stream) = connector.connect(&url).await.expect("connect");
        sink.send(r#"{"hello":"tv"}"#.to_string()).await.expect("send");

        let frame = stream.next().await.expect("frame").expect("text");
        assert_eq!(frame, r#"{"hello":"tv"}"#);

        sink.close().await;
    }

    #[tokio::test]
    async fn test_stream_ends_after_close() {
        let url = spawn_echo_server().await;
        let connector = WsConnector::new(Duration::from_secs(5));

        let (mut sink, mut stream) = connector.connect(&url).await.expect("connect");
        sink.close().await;

        // Server loop exits on close; the read half drains to None.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let url = Url::parse(&format!("ws://{addr}/")).expect("url");
        let connector = WsConnector::new(Duration::from_secs(5));

        let result = connector.connect(&url).await;
        match result {
            Ok(_) => panic!("connect to a closed port should fail"),
            Err(e) => assert!(e.is_connection_error()),
        }
    }
}
