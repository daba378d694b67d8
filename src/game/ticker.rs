//! Periodic coin relocation

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::app::AppState;
use crate::net::broadcast::broadcast_coin;

/// Relocate the coin every `period` and tell every connection.
///
/// The first relocation happens immediately.
pub async fn run_coin_ticker(state: AppState, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let connections = state.registry.lock().await;
        let coin = state.world.generate_coin();
        broadcast_coin(&connections, coin).await;
    }
}
