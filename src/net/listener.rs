//! Accept loop and per-connection reader

use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::app::AppState;

use super::framing::{Frame, LineReader};
use super::handler::{handle_message, remove_player, report_error};
use super::protocol::RequestError;
use super::registry::Connection;

/// Accept connections forever, one reader task each
pub async fn run_acceptor(listener: TcpListener, state: AppState) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let (reader, writer) = stream.into_split();
                let conn = Arc::new(Connection::new(addr, writer));
                state.registry.register(conn.clone()).await;

                let connections = state.registry.len().await;
                info!(
                    addr = %addr,
                    connections,
                    "New connection established"
                );

                tokio::spawn(run_reader(state.clone(), conn, reader));
            }
            Err(e) => {
                warn!(error = %e, "Accept failed");
            }
        }
    }
}

/// Read newline-delimited messages until the peer goes away.
///
/// A read error that leaves the stream usable is logged and reading resumes.
/// Lines longer than `READ_BUFFER_SIZE` are dropped and reported to the sender.
pub async fn run_reader<R>(state: AppState, conn: Arc<Connection>, reader: R)
where
    R: AsyncRead + Unpin,
{
    let limit = state.config.read_buffer_size;
    let mut frames = LineReader::new(reader, limit);

    loop {
        let payload = match frames.next_frame().await {
            Ok(Frame::Eof) => break,
            Ok(Frame::Line(line)) => line.trim_ascii(),
            Ok(Frame::TooLong) => {
                warn!(addr = %conn.addr(), limit, "Oversized message dropped");
                report_error(&conn, &RequestError::MessageTooLong(limit)).await;
                continue;
            }
            Err(e) if is_disconnect(&e) => {
                debug!(addr = %conn.addr(), error = %e, "Connection lost");
                break;
            }
            Err(e) => {
                warn!(addr = %conn.addr(), error = %e, "Read error");
                continue;
            }
        };

        if payload.is_empty() {
            continue;
        }

        if let Err(e) = handle_message(&state, &conn, payload).await {
            report_error(&conn, &e).await;
        }
    }

    close_connection(&state, &conn).await;
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

/// Deregister, close the write half and optionally drop the player
async fn close_connection(state: &AppState, conn: &Connection) {
    state.registry.unregister(&conn.addr()).await;

    if let Err(e) = conn.shutdown().await {
        debug!(addr = %conn.addr(), error = %e, "Connection shutdown error");
    }

    if state.config.remove_player_on_disconnect {
        if let Some(username) = conn.controlled_player() {
            if let Ok(deleted) = remove_player(state, &username).await {
                info!(addr = %conn.addr(), username = %deleted, "Removed player of closed connection");
            }
        }
    }

    info!(addr = %conn.addr(), "Connection closed");
}
