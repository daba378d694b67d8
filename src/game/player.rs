//! Player, projectile and coin records

use serde::{Deserialize, Serialize};

/// Position and velocity of a moving object
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub velocity_x: f64,
    #[serde(default)]
    pub velocity_y: f64,
}

impl Motion {
    pub fn new(x: f64, y: f64, velocity_x: f64, velocity_y: f64) -> Self {
        Self {
            x,
            y,
            velocity_x,
            velocity_y,
        }
    }
}

/// A live player (authoritative)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub username: String,
    #[serde(flatten)]
    pub motion: Motion,
    /// Carried for clients, nothing awards points yet
    pub score: u32,
    pub projectiles: Vec<Projectile>,
}

impl Player {
    pub fn new(username: String, motion: Motion) -> Self {
        Self {
            username,
            motion,
            score: 0,
            projectiles: Vec::new(),
        }
    }

    /// Projectile previously fired under a client key
    pub fn projectile_mut(&mut self, key: &str) -> Option<&mut Projectile> {
        self.projectiles.iter_mut().find(|p| p.key == key)
    }
}

/// Projectile fired by a player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projectile {
    /// Server-assigned, unique for the lifetime of the process
    pub id: u64,
    /// Key the client fired it under, used to re-fire it
    pub key: String,
    pub shooter: String,
    #[serde(flatten)]
    pub motion: Motion,
}

impl Projectile {
    pub fn new(id: u64, key: String, shooter: String, motion: Motion) -> Self {
        Self {
            id,
            key,
            shooter,
            motion,
        }
    }

    /// Redirect an existing projectile
    pub fn refire(&mut self, motion: Motion) {
        self.motion = motion;
    }
}

/// The shared collectible
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coin {
    pub x: f64,
    pub y: f64,
}
