//! Minimal HTTP/1.1 front end for the [`Gateway`].
//!
//! Each connection carries one request. The request line is parsed, headers are
//! drained within a fixed byte budget and the search runs on tokio's blocking pool so the accept loop is
//! never held up by a long scan. Responses are JSON with `Connection: close`.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::errors::SearchResult;
use crate::gateway::{Gateway, GatewayResponse};

const MAX_HEADER_LINES: usize = 100;
// Request line plus headers; anything beyond is never read.
const MAX_REQUEST_HEAD_BYTES: u64 = 16 * 1024;

/// An HTTP server bound to one gateway
pub struct Server {
    gateway: Arc<Gateway>,
    config: ServerConfig,
}

impl Server {
    pub fn new(gateway: Gateway, config: ServerConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config,
        }
    }

    pub fn address(&self) -> String {
        self.config.address()
    }

    pub async fn bind(&self) -> SearchResult<TcpListener> {
        Ok(TcpListener::bind(self.address()).await?)
    }

    /// Accepts connections until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> SearchResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!("Connection from {}", peer);
                            let gateway = Arc::clone(&self.gateway);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, gateway).await {
                                    error!("Connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutting down server");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Binds the configured address and serves until Ctrl-C
pub async fn start_server(server: Server) -> SearchResult<()> {
    let listener = server.bind().await?;
    info!("csvscout server listening on {}", server.address());
    for id in server.gateway.dataset_ids() {
        info!("  dataset: {}", id);
    }
    server
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

/// Reads the request line and drains the headers, never consuming more than
/// `MAX_REQUEST_HEAD_BYTES`. Returns `None` when the request line does not fit.
async fn read_request_line<R: AsyncRead + Unpin>(read: R) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(read.take(MAX_REQUEST_HEAD_BYTES));

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    if !request_line.ends_with('\n') {
        return Ok(None);
    }

    let mut header = String::new();
    for _ in 0..MAX_HEADER_LINES {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header.trim_end().is_empty() {
            break;
        }
    }
    Ok(Some(request_line))
}

async fn handle_connection(stream: TcpStream, gateway: Arc<Gateway>) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let request_line = read_request_line(read_half).await?.unwrap_or_default();

    let mut parts = request_line.split_whitespace();
    let response = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => {
            let method = method.to_string();
            let target = target.to_string();
            tokio::task::spawn_blocking(move || gateway.handle(&method, &target))
                .await
                .unwrap_or_else(|e| GatewayResponse::error(500, e.to_string()))
        }
        _ => GatewayResponse::error(400, "Malformed request line"),
    };

    write_half.write_all(&encode_response(&response)).await?;
    write_half.shutdown().await
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    }
}

fn encode_response(response: &GatewayResponse) -> Vec<u8> {
    let body = response.body.to_string();
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}
