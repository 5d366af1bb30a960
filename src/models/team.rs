//! Team names, Standing and AdvancingTeam.

use serde::{Deserialize, Serialize};

use crate::models::game::parse_placeholder;
use crate::models::tournament::TournamentError;

/// Default roster for `n` teams: "1. Team 1", "2. Team 2", ...
pub fn default_team_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{i}. Team {i}")).collect()
}

/// Trim and check a team name: non-empty and not a bracket placeholder.
pub fn validate_team_name(name: &str) -> Result<String, TournamentError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TournamentError::InvalidInput("team name cannot be empty".into()));
    }
    if parse_placeholder(trimmed).is_some() {
        return Err(TournamentError::InvalidInput(format!(
            "'{trimmed}' is reserved for bracket placeholders"
        )));
    }
    Ok(trimmed.to_string())
}

/// Group table row for one team. Recomputed from matches, never stored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    /// 3 per win, 1 per draw.
    pub points: u32,
    pub legs_for: u64,
    pub legs_against: u64,
    pub leg_diff: i64,
}

impl Standing {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Record one played match from this team's side.
    pub fn add_result(&mut self, legs_for: u32, legs_against: u32) {
        self.played += 1;
        self.legs_for = self.legs_for.saturating_add(u64::from(legs_for));
        self.legs_against = self.legs_against.saturating_add(u64::from(legs_against));
        if legs_for > legs_against {
            self.won += 1;
            self.points += 3;
        } else if legs_for < legs_against {
            self.lost += 1;
        } else {
            self.drawn += 1;
            self.points += 1;
        }
        self.leg_diff = leg_difference(self.legs_for, self.legs_against);
    }
}

fn leg_difference(legs_for: u64, legs_against: u64) -> i64 {
    let clamp = |legs: u64| i64::try_from(legs).unwrap_or(i64::MAX);
    clamp(legs_for).saturating_sub(clamp(legs_against))
}

/// A team that qualified for the knockout stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AdvancingTeam {
    pub name: String,
    /// 1-based group.
    pub group: u32,
    /// 1-based rank within its own group.
    pub position: u32,
}
