//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Each line is handled on its own task so a long scan does not block
//! `tools/list` or `ping`. Responses are written by a single task, one
//! JSON document per line.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::ServerError;
use crate::mcp::protocol::JsonRpcResponse;
use crate::mcp::server::McpServer;

/// Serve the process's stdin and stdout until stdin closes.
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<(), ServerError> {
    tracing::info!("MCP server reading from stdin");
    serve_io(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve any reader/writer pair. Returns once the reader hits EOF and every
/// in-flight request has been answered.
pub async fn serve_io<R, W>(
    server: Arc<McpServer>,
    reader: R,
    writer: W,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<JsonRpcResponse>(64);
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut lines = BufReader::new(reader).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = server.handle_bytes(line.as_bytes()).await {
                // Receiver only goes away if the writer failed.
                let _ = tx.send(response).await;
            }
        });

        // Reap finished handlers so the set doesn't grow unbounded.
        while let Some(result) = in_flight.try_join_next() {
            if let Err(e) = result {
                tracing::error!(error = %e, "request handler panicked");
            }
        }
    }

    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "request handler panicked");
        }
    }

    drop(tx);
    writer_task.await??;

    tracing::info!("stdin closed, MCP server stopping");
    Ok(())
}

async fn write_responses<W>(
    mut rx: mpsc::Receiver<JsonRpcResponse>,
    mut writer: W,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
