//! Request dispatch: validate, mutate the world, then fan out

use tracing::{debug, info, warn};

use crate::app::AppState;

use super::broadcast::{broadcast_deletion, broadcast_players};
use super::protocol::{ClientRequest, RequestError, ServerMsg};
use super::registry::Connection;

/// Apply one inbound message on behalf of `conn`.
///
/// Errors are returned for the caller to report to this connection only;
/// nothing is broadcast for a failed request.
pub async fn handle_message(
    state: &AppState,
    conn: &Connection,
    payload: &[u8],
) -> Result<(), RequestError> {
    match ClientRequest::decode(payload)? {
        ClientRequest::NewPlayer(player_info) => {
            let username = player_info.username.as_str();
            let connections = state.registry.lock().await;
            let created = state.world.create_player(username, player_info.motion());

            if created.already_existed {
                drop(connections);
                debug!(addr = %conn.addr(), username = %username, "Player already exists");
                let ack = ServerMsg::NewPlayer {
                    exists: true,
                    player_info: created.player.motion.into(),
                };
                send_msg(conn, &ack).await;
            } else {
                conn.set_controlled_player(username);
                info!(addr = %conn.addr(), username = %username, "Player created");
                broadcast_players(&state.world, &connections).await;
            }
        }

        ClientRequest::UpdatePlayerMovement(player_info) => {
            state
                .world
                .update_player_movement(&player_info.username, player_info.motion())?;
            broadcast_players(&state.world, &state.registry.lock().await).await;
        }

        ClientRequest::UpdatePlayerProjectiles {
            username,
            projectiles,
        } => {
            state
                .world
                .update_player_projectiles(&username, &projectiles)?;
            broadcast_players(&state.world, &state.registry.lock().await).await;
        }

        ClientRequest::DeletePlayer { username } => {
            let deleted = remove_player(state, &username).await?;
            info!(addr = %conn.addr(), username = %deleted, "Player deleted");
        }
    }

    Ok(())
}

/// Delete a player, clear every back-reference to it and announce it.
///
/// All three steps run under one registry lock, so a concurrent re-creation
/// of the same name keeps its own back-reference.
pub async fn remove_player(state: &AppState, username: &str) -> Result<String, RequestError> {
    let connections = state.registry.lock().await;
    let deleted = state.world.delete_player(username)?;
    connections.release_player(&deleted);
    broadcast_deletion(&connections, deleted.clone()).await;
    Ok(deleted)
}

/// Send a message to one connection, logging a failed write
pub async fn send_msg(conn: &Connection, msg: &ServerMsg) {
    let payload = match serde_json::to_vec(msg) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(addr = %conn.addr(), error = %e, "Failed to serialize reply");
            return;
        }
    };

    if let Err(e) = conn.send(&payload).await {
        warn!(addr = %conn.addr(), error = %e, "Reply write failed");
    }
}

/// Write a failed request back to its sender as a plain text line
pub async fn report_error(conn: &Connection, err: &RequestError) {
    debug!(addr = %conn.addr(), error = %err, "Request failed");
    let line = format!("error handling message: {}", err);
    if let Err(e) = conn.send(line.as_bytes()).await {
        warn!(addr = %conn.addr(), error = %e, "Error reply write failed");
    }
}
