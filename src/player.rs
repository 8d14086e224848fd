//! The two roles a game can be played between.

use std::str::FromStr;

/// A participant in the game: the agent (controls outputs) or the
/// environment (controls inputs).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Player {
    /// Controls the output variables; the side synthesis usually seeks a
    /// strategy for.
    Agent,
    /// Controls the input variables.
    Environment,
}

impl Player {
    /// The other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::Agent => Player::Environment,
            Player::Environment => Player::Agent,
        }
    }
}

/// Parses the `-s {0|1}` CLI convention of spec.md §6: `1` is the agent,
/// `0` is the environment.
impl FromStr for Player {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Player::Agent),
            "0" => Ok(Player::Environment),
            other => Err(format!("invalid starting player '{}', expected 0 or 1", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_convention() {
        assert_eq!("1".parse::<Player>().unwrap(), Player::Agent);
        assert_eq!("0".parse::<Player>().unwrap(), Player::Environment);
        assert!("2".parse::<Player>().is_err());
    }
}
