//! Operator console on stdin

use std::io::BufRead;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::game::World;

/// Console commands understood by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Log the current player map
    Players,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "players" => Some(Self::Players),
            _ => None,
        }
    }
}

/// Render the player map the way `players` prints it
pub fn dump_players(world: &World) -> Result<String, serde_json::Error> {
    serde_json::to_string(&world.players_snapshot())
}

/// Read commands from stdin on a dedicated thread until it closes
pub fn spawn_console(world: Arc<World>) -> std::io::Result<std::thread::JoinHandle<usize>> {
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || run_commands(std::io::stdin().lock(), &world))
}

fn run_commands<R: BufRead>(input: R, world: &World) -> usize {
    let mut executed = 0;

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Console read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Some(Command::Players) => match dump_players(world) {
                Ok(dump) => {
                    info!(players = %dump, "Current players");
                    executed += 1;
                }
                Err(e) => error!(error = %e, "Failed to serialize players"),
            },
            None => warn!(command = %line.trim(), "Unknown console command"),
        }
    }

    executed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Motion, ProjectileIds};

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("players"), Some(Command::Players));
        assert_eq!(Command::parse("  players \n"), Some(Command::Players));
        assert_eq!(Command::parse("quit"), None);
    }

    #[test]
    fn dump_is_the_player_map() {
        let world = World::new(Arc::new(ProjectileIds::new()), 0);
        assert_eq!(dump_players(&world).unwrap(), "{}");

        world.create_player("alice", Motion::new(1.0, 2.0, 0.0, 0.0));
        let dump: serde_json::Value = serde_json::from_str(&dump_players(&world).unwrap()).unwrap();
        assert_eq!(dump["alice"]["username"], "alice");
    }

    #[test]
    fn runs_known_commands_only() {
        let world = World::new(Arc::new(ProjectileIds::new()), 0);
        let input: &[u8] = b"players\nbogus\n\nplayers\n";
        assert_eq!(run_commands(input, &world), 2);
    }
}
