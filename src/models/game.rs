//! Match (game), Slot, and the unscheduled Pairing produced by round-robin.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::clock::hhmm;

/// Identifier of a match, dense from 1 within one generation run.
pub type MatchId = u32;

/// Prefix of the placeholder written into a knockout slot whose team is not known yet.
const PLACEHOLDER_PREFIX: &str = "Winner of Match ";

/// Placeholder team name for the winner of `id`.
pub fn placeholder_for(id: MatchId) -> String {
    format!("{PLACEHOLDER_PREFIX}{id}")
}

/// Upstream match id if `name` is a placeholder.
pub fn parse_placeholder(name: &str) -> Option<MatchId> {
    name.strip_prefix(PLACEHOLDER_PREFIX)?.parse().ok()
}

/// Which side of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    Team1,
    Team2,
}

/// Two teams that still need a time and a board.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub team1: String,
    pub team2: String,
}

impl Pairing {
    pub fn new(team1: impl Into<String>, team2: impl Into<String>) -> Self {
        Self {
            team1: team1.into(),
            team2: team2.into(),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }
}

/// A scheduled match, either group stage (`group` set) or knockout (`round` set).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    /// 1-based group, group stage only.
    #[serde(default)]
    pub group: Option<u32>,
    /// 1-based round, knockout only.
    #[serde(default)]
    pub round: Option<u32>,
    pub team1: String,
    pub team2: String,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// 1-based board number.
    pub board: u32,
    /// Legs won by team 1; None if not yet played.
    #[serde(default)]
    pub score1: Option<u32>,
    #[serde(default)]
    pub score2: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    /// Knockout only.
    #[serde(default)]
    pub winner: Option<String>,
    /// Knockout match the winner feeds into; None for the final.
    #[serde(default)]
    pub next_match_id: Option<MatchId>,
    #[serde(default)]
    pub next_match_position: Option<Slot>,
}

impl GameMatch {
    /// Unplayed group-stage match.
    pub fn group_stage(id: MatchId, group: u32, pairing: Pairing, time: NaiveTime, board: u32) -> Self {
        Self {
            id,
            group: Some(group),
            round: None,
            team1: pairing.team1,
            team2: pairing.team2,
            time,
            board,
            score1: None,
            score2: None,
            completed: false,
            winner: None,
            next_match_id: None,
            next_match_position: None,
        }
    }

    /// Unplayed knockout match; links are filled in by the bracket builder.
    pub fn knockout(
        id: MatchId,
        round: u32,
        team1: impl Into<String>,
        team2: impl Into<String>,
        time: NaiveTime,
        board: u32,
    ) -> Self {
        Self {
            id,
            group: None,
            round: Some(round),
            team1: team1.into(),
            team2: team2.into(),
            time,
            board,
            score1: None,
            score2: None,
            completed: false,
            winner: None,
            next_match_id: None,
            next_match_position: None,
        }
    }

    pub fn is_knockout(&self) -> bool {
        self.round.is_some()
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// Team currently in `slot`.
    pub fn team(&self, slot: Slot) -> &str {
        match slot {
            Slot::Team1 => &self.team1,
            Slot::Team2 => &self.team2,
        }
    }

    pub fn set_team(&mut self, slot: Slot, name: impl Into<String>) {
        match slot {
            Slot::Team1 => self.team1 = name.into(),
            Slot::Team2 => self.team2 = name.into(),
        }
    }

    /// Both slots hold real team names (no placeholders).
    pub fn is_ready(&self) -> bool {
        parse_placeholder(&self.team1).is_none() && parse_placeholder(&self.team2).is_none()
    }

    /// Winner by score (team 2 on a draw, as the bracket never stores draws).
    pub fn winner_by_score(&self) -> Option<&str> {
        match (self.score1, self.score2) {
            (Some(s1), Some(s2)) if s1 > s2 => Some(&self.team1),
            (Some(_), Some(_)) => Some(&self.team2),
            _ => None,
        }
    }
}
