//! Event fan-out built on the connection registry
//!
//! Every function here writes through a held registry lock, so messages
//! reach each client in the order their contents were produced.

use tracing::{debug, error};

use crate::game::{Coin, World};

use super::protocol::ServerMsg;
use super::registry::{BroadcastReport, Connections};

/// Serialize once and push to every connection
pub async fn broadcast_msg(connections: &Connections<'_>, msg: &ServerMsg) -> BroadcastReport {
    let payload = match serde_json::to_vec(msg) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "Failed to serialize broadcast");
            return BroadcastReport::default();
        }
    };

    let report = connections.broadcast(&payload).await;
    debug!(
        delivered = report.delivered,
        failed = report.failed,
        bytes = payload.len(),
        "Broadcast sent"
    );
    report
}

/// Send the full player map, unless there are no players.
///
/// The snapshot is taken under the registry lock. Returns `None` when
/// nothing was sent.
pub async fn broadcast_players(world: &World, connections: &Connections<'_>) -> Option<BroadcastReport> {
    let players = world.players_snapshot();
    if players.is_empty() {
        return None;
    }

    Some(broadcast_msg(connections, &ServerMsg::UpdatePlayers { players }).await)
}

pub async fn broadcast_deletion(connections: &Connections<'_>, username: String) -> BroadcastReport {
    broadcast_msg(connections, &ServerMsg::DeletePlayer { username }).await
}

pub async fn broadcast_coin(connections: &Connections<'_>, coin: Coin) -> BroadcastReport {
    broadcast_msg(connections, &ServerMsg::CoinUpdate { coin_info: coin }).await
}
