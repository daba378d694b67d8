//! Game world modules

pub mod ids;
pub mod player;
pub mod ticker;
pub mod world;

pub use ids::ProjectileIds;
pub use player::{Coin, Motion, Player, Projectile};
pub use world::{PlayerCreation, PlayerMap, ProjectileRequest, World, WorldError};

/// Play field width
pub const FIELD_WIDTH: u32 = 750;
/// Play field height
pub const FIELD_HEIGHT: u32 = 500;
/// Coin hitbox radius, keeps it off the far edges
pub const COIN_RADIUS: u32 = 10;
