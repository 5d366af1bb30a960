//! Tournament (group stage), Phase and TournamentError.

use crate::models::game::{GameMatch, MatchId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during tournament operations.
/// Every operation validates before mutating, so an `Err` leaves state untouched.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TournamentError {
    /// Malformed configuration: zero boards, zero groups, too few teams, bad time.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Group stage not finished, or nobody qualifies for the knockout stage.
    #[error("Cannot start finals: {0}")]
    InsufficientData(String),
    /// Knockout match submitted with equal scores.
    #[error("Knockout matches cannot end in a tie (match {match_id})")]
    InvalidScore { match_id: MatchId },
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    /// Knockout match whose opponents are not both known yet.
    #[error("Match {0} is still waiting for its opponents")]
    MatchNotReady(MatchId),
    #[error("Team '{0}' not found")]
    TeamNotFound(String),
    /// Team names are unique; they identify teams across groups and matches.
    #[error("A team named '{0}' already exists")]
    DuplicateTeamName(String),
}

/// Current phase, derived from what has been generated and scored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Roster and settings; no tournament generated.
    #[default]
    Setup,
    /// Groups and schedule exist; no bracket yet.
    GroupStage,
    /// Bracket built, final not decided.
    Knockout,
    /// Final decided.
    Completed,
}

/// The group stage: groups partition the roster, matches are the round-robin schedule.
///
/// Missing `groups` or `matches` in stored data deserialize as empty lists.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    #[serde(default)]
    pub groups: Vec<Vec<String>>,
    #[serde(default)]
    pub matches: Vec<GameMatch>,
}

impl Tournament {
    pub fn new(groups: Vec<Vec<String>>, matches: Vec<GameMatch>) -> Self {
        Self { groups, matches }
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut GameMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Matches belonging to 1-based `group`.
    pub fn group_matches(&self, group: u32) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| m.group == Some(group))
    }

    pub fn completed_count(&self) -> usize {
        self.matches.iter().filter(|m| m.completed).count()
    }

    /// Every scheduled group match has a result.
    pub fn is_group_stage_complete(&self) -> bool {
        self.completed_count() == self.matches.len()
    }

    pub fn contains_team(&self, name: &str) -> bool {
        self.groups.iter().flatten().any(|t| t == name)
    }
}
