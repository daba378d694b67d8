//! Application state shared across tasks

use std::sync::Arc;

use crate::config::Config;
use crate::game::{ProjectileIds, World};
use crate::net::ConnectionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<World>,
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Projectile ids are process-wide, independent of the world lock
        let ids = Arc::new(ProjectileIds::new());

        let seed = config.world_seed.unwrap_or_else(rand::random);
        let world = Arc::new(World::new(ids, seed));

        let registry = Arc::new(ConnectionRegistry::new());

        Self {
            config,
            world,
            registry,
        }
    }
}
