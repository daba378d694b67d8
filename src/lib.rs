//! Arena Server - authoritative state-synchronization server
//!
//! Clients hold a persistent TCP stream and exchange newline-delimited JSON.
//! Each message mutates one shared world under a single lock; every change
//! is fanned out to all connected clients.
//!
//! - `game`: world state, players, projectiles, the coin and its ticker
//! - `net`: framing, request dispatch, connection registry, broadcast
//! - `http`: optional admin endpoints
//! - `app`: shared state and the operator console

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod net;
pub mod util;

pub use app::AppState;
pub use config::Config;
