//! Stdio transport: newline-delimited JSON-RPC between the client and this server.
//!
//! Each request runs on its own task so a slow `tools/call` never blocks
//! `ping` or a `notifications/cancelled` for it. Responses funnel through one
//! writer task so lines never interleave.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use {
    serde_json::Value,
    tokio::{
        io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
        sync::mpsc,
        task::JoinSet,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, trace, warn},
};

use crate::{
    error::{Context, Error, Result},
    server::McpServer,
    types::{
        CancelledParams, INVALID_REQUEST, JsonRpcError, JsonRpcMessage, JsonRpcRequest,
        JsonRpcResponse, PARSE_ERROR,
    },
};

/// In-flight requests by the string form of their id.
type InFlight = Arc<Mutex<HashMap<String, CancellationToken>>>;

/// Serve MCP on the process's stdin/stdout until stdin closes.
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    serve(server, stdin, tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented reader/writer pair.
///
/// Returns when `reader` hits EOF and every request already read has been
/// answered, or with [`Error::Io`] as soon as reading fails.
pub async fn serve<R, W>(server: McpServer, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let server = Arc::new(server);
    let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
    let writer_task = tokio::spawn(write_responses(writer, rx));
    let in_flight: InFlight = Arc::default();
    let mut tasks = JoinSet::new();

    info!("MCP server listening on stdio");
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        trace!(raw = %trimmed, "client -> server");

        let message = match serde_json::from_str::<JsonRpcMessage>(trimmed) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                let _ = tx.send(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                ));
                continue;
            },
        };

        match (message.id, message.method) {
            (Some(id), Some(method)) => {
                let request = JsonRpcRequest {
                    jsonrpc: message.jsonrpc,
                    id,
                    method,
                    params: message.params,
                };
                spawn_request(&mut tasks, &server, &in_flight, &tx, request);
            },
            (None, Some(method)) => handle_notification(&in_flight, &method, message.params),
            (Some(id), None) => {
                let _ = tx.send(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(INVALID_REQUEST, "missing method"),
                ));
            },
            (None, None) => debug!("ignoring message without id or method"),
        }

        // Reap finished tasks so the set does not grow for the whole session.
        while let Some(joined) = tasks.try_join_next() {
            log_join(joined);
        }
    }

    debug!("stdin closed, draining in-flight requests");
    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
    drop(tx);
    writer_task
        .await
        .map_err(|e| Error::external("response writer task", e))?
}

fn spawn_request(
    tasks: &mut JoinSet<()>,
    server: &Arc<McpServer>,
    in_flight: &InFlight,
    tx: &mpsc::UnboundedSender<JsonRpcResponse>,
    request: JsonRpcRequest,
) {
    let key = request.id.to_string();
    let cancel = CancellationToken::new();
    lock(in_flight).insert(key.clone(), cancel.clone());

    let server = Arc::clone(server);
    let in_flight = Arc::clone(in_flight);
    let tx = tx.clone();
    tasks.spawn(async move {
        let response = server.handle(request, cancel.clone()).await;
        lock(&in_flight).remove(&key);
        // A cancelled request gets no response.
        if cancel.is_cancelled() {
            debug!(id = %key, "dropping response to cancelled request");
            return;
        }
        let _ = tx.send(response);
    });
}

fn handle_notification(in_flight: &InFlight, method: &str, params: Option<Value>) {
    match method {
        "notifications/initialized" => debug!("client initialized"),
        "notifications/cancelled" => {
            let params = params.map(serde_json::from_value::<CancelledParams>);
            let Some(Ok(params)) = params else {
                warn!("notifications/cancelled without a valid requestId");
                return;
            };
            let key = params.request_id.to_string();
            match lock(in_flight).get(&key) {
                Some(token) => {
                    info!(
                        id = %key,
                        reason = params.reason.as_deref().unwrap_or(""),
                        "request cancelled by client"
                    );
                    token.cancel();
                },
                None => debug!(id = %key, "cancel for unknown or finished request"),
            }
        },
        _ => trace!(%method, "ignoring notification"),
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        trace!(raw = %payload.trim_end(), "server -> client");
        writer
            .write_all(payload.as_bytes())
            .await
            .context("write response")?;
        writer.flush().await.context("flush response")?;
    }
    Ok(())
}

fn lock(in_flight: &InFlight) -> std::sync::MutexGuard<'_, HashMap<String, CancellationToken>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "request task failed");
    }
}
