//! Tournament settings as entered on the setup screen.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::clock::hhmm;
use crate::models::tournament::TournamentError;

/// Largest roster a competition accepts.
pub const MAX_TEAMS: u32 = 256;
/// More boards than half the largest roster can never be used at once.
pub const MAX_BOARDS: u32 = MAX_TEAMS / 2;
/// One match may last at most a day.
pub const MAX_MATCH_MINUTES: u32 = 24 * 60;

/// Organizer-chosen settings. Missing fields fall back to the defaults.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tournament_name: String,
    pub num_teams: u32,
    pub num_boards: u32,
    pub num_groups: u32,
    /// Minutes per match (one schedule slot).
    pub match_duration: u32,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Teams per group that reach the knockout stage.
    pub teams_advancing: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tournament_name: "Dart Tournament Scheduler".to_string(),
            num_teams: 8,
            num_boards: 2,
            num_groups: 2,
            match_duration: 15,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            teams_advancing: 2,
        }
    }
}

impl Settings {
    pub fn match_length(&self) -> Duration {
        Duration::minutes(i64::from(self.match_duration))
    }

    /// Reject values the scheduler and bracket builder cannot work with.
    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.num_teams > MAX_TEAMS {
            return Err(TournamentError::InvalidInput(format!(
                "at most {MAX_TEAMS} teams are supported (got {})",
                self.num_teams
            )));
        }
        if self.num_boards > MAX_BOARDS {
            return Err(TournamentError::InvalidInput(format!(
                "at most {MAX_BOARDS} boards are supported (got {})",
                self.num_boards
            )));
        }
        if self.num_groups > MAX_TEAMS {
            return Err(TournamentError::InvalidInput(format!(
                "at most {MAX_TEAMS} groups are supported (got {})",
                self.num_groups
            )));
        }
        if self.match_duration > MAX_MATCH_MINUTES {
            return Err(TournamentError::InvalidInput(format!(
                "a match can last at most {MAX_MATCH_MINUTES} minutes (got {})",
                self.match_duration
            )));
        }
        if self.num_boards < 1 {
            return Err(TournamentError::InvalidInput("at least one board is required".into()));
        }
        if self.num_groups < 1 {
            return Err(TournamentError::InvalidInput("at least one group is required".into()));
        }
        if self.match_duration < 1 {
            return Err(TournamentError::InvalidInput("match duration must be positive".into()));
        }
        if self.teams_advancing < 1 {
            return Err(TournamentError::InvalidInput(
                "at least one team per group must advance".into(),
            ));
        }
        Ok(())
    }
}
