//! Authoritative world state
//!
//! Every operation takes the single world lock for its whole duration, so
//! check-then-act sequences (exists + insert, lookup + mutate, lookup +
//! delete) can never interleave with another request.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::ids::ProjectileIds;
use super::player::{Coin, Motion, Player, Projectile};
use super::{COIN_RADIUS, FIELD_HEIGHT, FIELD_WIDTH};

/// Snapshot of the player map, keyed by username
pub type PlayerMap = BTreeMap<String, Player>;

/// Requested projectile motion; every field must be present
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize)]
pub struct ProjectileRequest {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub velocity_x: Option<f64>,
    #[serde(default)]
    pub velocity_y: Option<f64>,
}

impl ProjectileRequest {
    pub fn new(x: f64, y: f64, velocity_x: f64, velocity_y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            velocity_x: Some(velocity_x),
            velocity_y: Some(velocity_y),
        }
    }

    fn validate(&self, key: &str) -> Result<Motion, WorldError> {
        let field = |value: Option<f64>, name: &'static str| {
            value.ok_or_else(|| WorldError::InvalidProjectile {
                key: key.to_string(),
                field: name,
            })
        };

        Ok(Motion {
            x: field(self.x, "x")?,
            y: field(self.y, "y")?,
            velocity_x: field(self.velocity_x, "velocity_x")?,
            velocity_y: field(self.velocity_y, "velocity_y")?,
        })
    }
}

/// Result of a create request
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCreation {
    /// The newly inserted player, or the untouched existing one
    pub player: Player,
    pub already_existed: bool,
}

/// World mutation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("player with username `{0}` does not exist")]
    PlayerNotFound(String),

    #[error("`{field}` attribute not found in projectile `{key}`")]
    InvalidProjectile { key: String, field: &'static str },
}

struct WorldInner {
    players: PlayerMap,
    coin: Coin,
    rng: ChaCha8Rng,
}

/// Players, their projectiles and the coin
pub struct World {
    inner: Mutex<WorldInner>,
    ids: Arc<ProjectileIds>,
}

impl World {
    /// Create an empty world drawing projectile ids from `ids`
    pub fn new(ids: Arc<ProjectileIds>, seed: u64) -> Self {
        Self {
            inner: Mutex::new(WorldInner {
                players: PlayerMap::new(),
                coin: Coin::default(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
            ids,
        }
    }

    /// Move the coin to a random spot inside the play field
    pub fn generate_coin(&self) -> Coin {
        let mut inner = self.inner.lock();
        let x = inner.rng.gen_range(0..=FIELD_WIDTH - COIN_RADIUS);
        let y = inner.rng.gen_range(0..=FIELD_HEIGHT - COIN_RADIUS);
        inner.coin = Coin {
            x: x as f64,
            y: y as f64,
        };
        debug!(x, y, "Coin relocated");
        inner.coin
    }

    pub fn coin(&self) -> Coin {
        self.inner.lock().coin
    }

    /// Insert a player unless the username is taken
    pub fn create_player(&self, username: &str, motion: Motion) -> PlayerCreation {
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.players.get(username) {
            return PlayerCreation {
                player: existing.clone(),
                already_existed: true,
            };
        }

        let player = Player::new(username.to_string(), motion);
        inner.players.insert(username.to_string(), player.clone());

        PlayerCreation {
            player,
            already_existed: false,
        }
    }

    /// Replace a player's position and velocity
    pub fn update_player_movement(&self, username: &str, motion: Motion) -> Result<Player, WorldError> {
        let mut inner = self.inner.lock();
        let player = inner
            .players
            .get_mut(username)
            .ok_or_else(|| WorldError::PlayerNotFound(username.to_string()))?;

        player.motion = motion;
        Ok(player.clone())
    }

    /// Fire or re-fire a batch of projectiles for a player.
    ///
    /// Keys already fired by the player are redirected in place; unknown keys
    /// get a fresh id. The whole batch is validated before anything changes.
    pub fn update_player_projectiles(
        &self,
        username: &str,
        requests: &BTreeMap<String, ProjectileRequest>,
    ) -> Result<Player, WorldError> {
        let mut inner = self.inner.lock();
        let player = inner
            .players
            .get_mut(username)
            .ok_or_else(|| WorldError::PlayerNotFound(username.to_string()))?;

        let validated = requests
            .iter()
            .map(|(key, request)| request.validate(key).map(|motion| (key, motion)))
            .collect::<Result<Vec<_>, WorldError>>()?;

        for (key, motion) in validated {
            match player.projectile_mut(key) {
                Some(projectile) => projectile.refire(motion),
                None => {
                    let id = self.ids.next();
                    player.projectiles.push(Projectile::new(
                        id,
                        key.clone(),
                        username.to_string(),
                        motion,
                    ));
                }
            }
        }

        Ok(player.clone())
    }

    /// Remove a player, returning its username
    pub fn delete_player(&self, username: &str) -> Result<String, WorldError> {
        let mut inner = self.inner.lock();
        inner
            .players
            .remove(username)
            .map(|player| player.username)
            .ok_or_else(|| WorldError::PlayerNotFound(username.to_string()))
    }

    pub fn player(&self, username: &str) -> Option<Player> {
        self.inner.lock().players.get(username).cloned()
    }

    /// Consistent copy of every player
    pub fn players_snapshot(&self) -> PlayerMap {
        self.inner.lock().players.clone()
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn world() -> World {
        World::new(Arc::new(ProjectileIds::new()), 7)
    }

    fn batch(entries: &[(&str, ProjectileRequest)]) -> BTreeMap<String, ProjectileRequest> {
        entries
            .iter()
            .map(|(key, request)| (key.to_string(), *request))
            .collect()
    }

    #[test]
    fn coin_stays_inside_field() {
        let world = world();
        for _ in 0..1000 {
            let coin = world.generate_coin();
            assert!(coin.x >= 0.0 && coin.x <= (FIELD_WIDTH - COIN_RADIUS) as f64);
            assert!(coin.y >= 0.0 && coin.y <= (FIELD_HEIGHT - COIN_RADIUS) as f64);
            assert_eq!(coin.x.fract(), 0.0);
            assert_eq!(world.coin(), coin);
        }
    }

    #[test]
    fn same_seed_places_coin_identically() {
        let a = World::new(Arc::new(ProjectileIds::new()), 99);
        let b = World::new(Arc::new(ProjectileIds::new()), 99);
        for _ in 0..10 {
            assert_eq!(a.generate_coin(), b.generate_coin());
        }
    }

    #[test]
    fn alice_lifecycle() {
        let world = world();

        let created = world.create_player("alice", Motion::new(10.0, 20.0, 0.0, 0.0));
        assert!(!created.already_existed);
        assert_eq!(world.player_count(), 1);
        let alice = world.player("alice").unwrap();
        assert_eq!(alice.motion, Motion::new(10.0, 20.0, 0.0, 0.0));
        assert!(alice.projectiles.is_empty());
        assert_eq!(alice.score, 0);

        let again = world.create_player("alice", Motion::new(99.0, 99.0, 3.0, 3.0));
        assert!(again.already_existed);
        assert_eq!(again.player.motion, Motion::new(10.0, 20.0, 0.0, 0.0));
        assert_eq!(world.player("alice").unwrap().motion, Motion::new(10.0, 20.0, 0.0, 0.0));

        world
            .update_player_movement("alice", Motion::new(15.0, 20.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(world.player("alice").unwrap().motion.x, 15.0);

        let alice = world
            .update_player_projectiles(
                "alice",
                &batch(&[("p1", ProjectileRequest::new(15.0, 20.0, 1.0, 0.0))]),
            )
            .unwrap();
        assert_eq!(alice.projectiles.len(), 1);
        assert_eq!(alice.projectiles[0].id, 1);
        assert_eq!(alice.projectiles[0].shooter, "alice");
        assert_eq!(alice.projectiles[0].motion, Motion::new(15.0, 20.0, 1.0, 0.0));

        assert_eq!(world.delete_player("alice"), Ok("alice".to_string()));
        assert!(world.player("alice").is_none());
        assert_eq!(
            world.update_player_movement("alice", Motion::new(1.0, 1.0, 0.0, 0.0)),
            Err(WorldError::PlayerNotFound("alice".to_string()))
        );
    }

    #[test]
    fn movement_keeps_projectiles_and_score() {
        let world = world();
        world.create_player("bob", Motion::default());
        world
            .update_player_projectiles("bob", &batch(&[("a", ProjectileRequest::new(0.0, 0.0, 1.0, 1.0))]))
            .unwrap();

        let bob = world
            .update_player_movement("bob", Motion::new(5.0, 6.0, 7.0, 8.0))
            .unwrap();
        assert_eq!(bob.motion, Motion::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(bob.projectiles.len(), 1);
        assert_eq!(bob.score, 0);
    }

    #[test]
    fn refire_redirects_instead_of_duplicating() {
        let world = world();
        world.create_player("bob", Motion::default());

        let first = world
            .update_player_projectiles("bob", &batch(&[("a", ProjectileRequest::new(0.0, 0.0, 1.0, 0.0))]))
            .unwrap();
        let id = first.projectiles[0].id;

        let second = world
            .update_player_projectiles(
                "bob",
                &batch(&[
                    ("a", ProjectileRequest::new(9.0, 9.0, 0.0, -1.0)),
                    ("b", ProjectileRequest::new(1.0, 1.0, 1.0, 1.0)),
                ]),
            )
            .unwrap();

        assert_eq!(second.projectiles.len(), 2);
        let a = second.projectiles.iter().find(|p| p.key == "a").unwrap();
        assert_eq!(a.id, id);
        assert_eq!(a.motion, Motion::new(9.0, 9.0, 0.0, -1.0));
        let b = second.projectiles.iter().find(|p| p.key == "b").unwrap();
        assert_ne!(b.id, id);
    }

    #[test]
    fn invalid_projectile_batch_changes_nothing() {
        let ids = Arc::new(ProjectileIds::new());
        let world = World::new(ids.clone(), 1);
        world.create_player("carol", Motion::default());
        world
            .update_player_projectiles("carol", &batch(&[("a", ProjectileRequest::new(0.0, 0.0, 1.0, 0.0))]))
            .unwrap();
        let before = world.player("carol").unwrap();
        let last_id = ids.last();

        let missing_vy = ProjectileRequest {
            velocity_y: None,
            ..ProjectileRequest::new(1.0, 1.0, 1.0, 1.0)
        };
        let result = world.update_player_projectiles(
            "carol",
            &batch(&[
                ("a", ProjectileRequest::new(50.0, 50.0, 2.0, 2.0)),
                ("b", ProjectileRequest::new(3.0, 3.0, 3.0, 3.0)),
                ("c", missing_vy),
            ]),
        );

        assert_eq!(
            result,
            Err(WorldError::InvalidProjectile {
                key: "c".to_string(),
                field: "velocity_y",
            })
        );
        assert_eq!(world.player("carol").unwrap(), before);
        assert_eq!(ids.last(), last_id);
    }

    #[test]
    fn operations_on_absent_player_fail() {
        let world = world();
        let missing = Err(WorldError::PlayerNotFound("ghost".to_string()));
        assert_eq!(world.update_player_movement("ghost", Motion::default()), missing);
        assert_eq!(
            world.update_player_projectiles("ghost", &BTreeMap::new()),
            Err(WorldError::PlayerNotFound("ghost".to_string()))
        );
        assert_eq!(
            world.delete_player("ghost"),
            Err(WorldError::PlayerNotFound("ghost".to_string()))
        );
        assert_eq!(world.player_count(), 0);
    }

    #[test]
    fn concurrent_lifecycle_keeps_exact_username_set() {
        let world = Arc::new(world());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let world = world.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let name = format!("p{}-{}", t, i);
                        assert!(!world.create_player(&name, Motion::default()).already_existed);
                        world
                            .update_player_movement(&name, Motion::new(i as f64, 0.0, 0.0, 0.0))
                            .unwrap();
                        if i % 2 == 0 {
                            world.delete_player(&name).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected: BTreeSet<String> = (0..8)
            .flat_map(|t| (0..100).filter(|i| i % 2 == 1).map(move |i| format!("p{}-{}", t, i)))
            .collect();
        let actual: BTreeSet<String> = world.players_snapshot().into_keys().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn concurrent_creates_of_one_name_insert_once() {
        let world = Arc::new(world());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let world = world.clone();
                std::thread::spawn(move || {
                    world
                        .create_player("dup", Motion::new(i as f64, 0.0, 0.0, 0.0))
                        .already_existed
                })
            })
            .collect();

        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|existed| !existed)
            .count();
        assert_eq!(fresh, 1);
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn concurrent_shots_get_distinct_ids() {
        let world = Arc::new(world());
        for t in 0..4 {
            world.create_player(&format!("s{}", t), Motion::default());
        }

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let world = world.clone();
                std::thread::spawn(move || {
                    let name = format!("s{}", t);
                    for i in 0..50 {
                        let key = format!("k{}", i);
                        world
                            .update_player_projectiles(
                                &name,
                                &batch(&[(key.as_str(), ProjectileRequest::new(0.0, 0.0, 1.0, 0.0))]),
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: Vec<u64> = world
            .players_snapshot()
            .values()
            .flat_map(|p| p.projectiles.iter().map(|proj| proj.id))
            .collect();
        let unique: BTreeSet<u64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(unique.len(), 200);
    }
}
