//! Wire protocol message definitions
//! One JSON document per line in both directions

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::game::{Coin, Motion, PlayerMap, ProjectileRequest, WorldError};

/// Discriminator field carried by every message
pub const REQUEST_TYPE: &str = "request_type";

pub const NEW_PLAYER: &str = "new-player";
pub const UPDATE_PLAYER_MOVEMENT: &str = "update-player-movement";
pub const UPDATE_PLAYER_PROJECTILES: &str = "update-player-projectiles";
pub const DELETE_PLAYER: &str = "delete-player";

/// Player fields sent with create and movement requests
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerInfo {
    pub username: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub velocity_x: f64,
    #[serde(default)]
    pub velocity_y: f64,
}

impl PlayerInfo {
    pub fn motion(&self) -> Motion {
        Motion::new(self.x, self.y, self.velocity_x, self.velocity_y)
    }
}

/// Only the username is needed to address a shooter
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerRef {
    pub username: String,
}

#[derive(Deserialize)]
struct PlayerInfoBody {
    player_info: PlayerInfo,
}

#[derive(Deserialize)]
struct ProjectilesBody {
    player_info: PlayerRef,
    projectiles: BTreeMap<String, ProjectileRequest>,
}

#[derive(Deserialize)]
struct DeleteBody {
    username: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    NewPlayer(PlayerInfo),
    UpdatePlayerMovement(PlayerInfo),
    UpdatePlayerProjectiles {
        username: String,
        projectiles: BTreeMap<String, ProjectileRequest>,
    },
    DeletePlayer {
        username: String,
    },
}

impl ClientRequest {
    /// Strictly decode one message.
    ///
    /// Invalid JSON is a decode error; a missing or mistyped field is a schema
    /// error; an unknown `request_type` is reported as unrecognized.
    pub fn decode(payload: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(payload).map_err(RequestError::Decode)?;
        let Value::Object(mut fields) = value else {
            return Err(RequestError::Schema("expected a JSON object".to_string()));
        };

        let request_type = match fields.remove(REQUEST_TYPE) {
            Some(Value::String(request_type)) => request_type,
            Some(_) => {
                return Err(RequestError::Schema(format!("`{}` must be a string", REQUEST_TYPE)))
            }
            None => {
                return Err(RequestError::Schema(format!(
                    "expected `{}` attribute",
                    REQUEST_TYPE
                )))
            }
        };

        match request_type.as_str() {
            NEW_PLAYER => {
                let body: PlayerInfoBody = parse_body(fields)?;
                Ok(Self::NewPlayer(body.player_info))
            }
            UPDATE_PLAYER_MOVEMENT => {
                let body: PlayerInfoBody = parse_body(fields)?;
                Ok(Self::UpdatePlayerMovement(body.player_info))
            }
            UPDATE_PLAYER_PROJECTILES => {
                let body: ProjectilesBody = parse_body(fields)?;
                Ok(Self::UpdatePlayerProjectiles {
                    username: body.player_info.username,
                    projectiles: body.projectiles,
                })
            }
            DELETE_PLAYER => {
                let body: DeleteBody = parse_body(fields)?;
                Ok(Self::DeletePlayer {
                    username: body.username,
                })
            }
            _ => Err(RequestError::UnrecognizedRequest(request_type)),
        }
    }
}

fn parse_body<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, RequestError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| RequestError::Schema(e.to_string()))
}

/// Position-only view used in the duplicate-creation ack
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionInfo {
    pub x: f64,
    pub y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
}

impl From<Motion> for PositionInfo {
    fn from(motion: Motion) -> Self {
        Self {
            x: motion.x,
            y: motion.y,
            velocity_x: motion.velocity_x,
            velocity_y: motion.velocity_y,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "request_type", rename_all = "kebab-case")]
pub enum ServerMsg {
    /// Full player map after a change
    UpdatePlayers { players: PlayerMap },

    /// A player left the world
    DeletePlayer { username: String },

    /// The coin moved
    CoinUpdate { coin_info: Coin },

    /// Reply to a create for a username that is already live
    NewPlayer { exists: bool, player_info: PositionInfo },
}

/// Request failures, reported back to the sender only
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("error parsing json: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("json format is incorrect: {0}")]
    Schema(String),

    #[error("did not receive valid `request_type`: `{0}`")]
    UnrecognizedRequest(String),

    #[error("message exceeds {0} bytes")]
    MessageTooLong(usize),

    #[error(transparent)]
    World(#[from] WorldError),
}
