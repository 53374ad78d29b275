use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix shared by every match room on the signaling service.
pub const ROOM_PREFIX: &str = "FPS_MATCH_ROOM_";

/// Derive the shared room name for a mode token.
///
/// Peers find each other only through this name, so it must match
/// exactly across every client build.
pub fn room_name_for_token(token: &str) -> String {
    format!("{ROOM_PREFIX}{}", token.to_uppercase())
}

/// Match modes offered in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Offline practice against bots; no networking.
    Solo,
    /// 1v1
    Duel,
    /// 2v2
    Duos,
    /// 3v3
    Trios,
}

impl MatchMode {
    pub const ALL: [MatchMode; 4] = [Self::Solo, Self::Duel, Self::Duos, Self::Trios];

    /// Lobby token for this mode.
    pub fn token(self) -> &'static str {
        match self {
            Self::Solo => "1vBot",
            Self::Duel => "1v1",
            Self::Duos => "2v2",
            Self::Trios => "3v3",
        }
    }

    pub fn is_networked(self) -> bool {
        self != Self::Solo
    }

    /// Players (host included) needed before the match starts.
    pub fn required_players(self) -> usize {
        match self {
            Self::Solo => 1,
            Self::Duel => 2,
            Self::Duos => 4,
            Self::Trios => 6,
        }
    }

    /// Room name on the signaling service, `None` for offline play.
    pub fn room_name(self) -> Option<String> {
        self.is_networked()
            .then(|| room_name_for_token(self.token()))
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match mode token: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for MatchMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn room_names_match_convention() {
        assert_eq!(
            MatchMode::Duel.room_name().as_deref(),
            Some("FPS_MATCH_ROOM_1V1")
        );
        assert_eq!(
            MatchMode::Duos.room_name().as_deref(),
            Some("FPS_MATCH_ROOM_2V2")
        );
        assert_eq!(
            MatchMode::Trios.room_name().as_deref(),
            Some("FPS_MATCH_ROOM_3V3")
        );
        assert_eq!(MatchMode::Solo.room_name(), None);
    }

    #[test]
    fn required_players_per_mode() {
        assert_eq!(MatchMode::Solo.required_players(), 1);
        assert_eq!(MatchMode::Duel.required_players(), 2);
        assert_eq!(MatchMode::Duos.required_players(), 4);
        assert_eq!(MatchMode::Trios.required_players(), 6);
    }

    #[test]
    fn parse_tokens_case_insensitively() {
        assert_eq!("2v2".parse::<MatchMode>(), Ok(MatchMode::Duos));
        assert_eq!("1VBOT".parse::<MatchMode>(), Ok(MatchMode::Solo));
        assert!("5v5".parse::<MatchMode>().is_err());
    }

    #[test]
    fn token_roundtrips_through_parse() {
        for mode in MatchMode::ALL {
            assert_eq!(mode.token().parse::<MatchMode>(), Ok(mode));
        }
    }

    proptest! {
        #[test]
        fn room_name_is_pure(token in "[a-zA-Z0-9]{1,12}") {
            let a = room_name_for_token(&token);
            let b = room_name_for_token(&token);
            prop_assert_eq!(&a, &b);
            prop_assert!(a.starts_with(ROOM_PREFIX));
            prop_assert_eq!(&a[ROOM_PREFIX.len()..], token.to_uppercase());
        }

        #[test]
        fn room_name_ignores_token_case(token in "[a-z0-9]{1,12}") {
            prop_assert_eq!(
                room_name_for_token(&token),
                room_name_for_token(&token.to_uppercase())
            );
        }
    }
}
