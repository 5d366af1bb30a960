//! Competition: the top-level state container (settings, roster, group stage, bracket).

use crate::models::clock::hhmm_option;
use crate::models::game::{GameMatch, MatchId};
use crate::models::settings::{Settings, MAX_TEAMS};
use crate::models::team::{default_team_names, validate_team_name};
use crate::models::tournament::{Phase, Tournament, TournamentError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a competition.
pub type CompetitionId = Uuid;

/// Everything one organizer works on. Logic functions take `&mut Competition`
/// and either apply a complete change or return an error with nothing changed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    #[serde(default)]
    pub settings: Settings,
    /// Roster in entry order; names are unique.
    #[serde(default)]
    pub team_names: Vec<String>,
    /// None until generated (Setup phase).
    #[serde(default)]
    pub tournament: Option<Tournament>,
    /// Knockout bracket, empty until created.
    #[serde(default)]
    pub knockout_matches: Vec<GameMatch>,
    /// Suggested knockout start, set when the group stage is generated.
    #[serde(default, with = "hhmm_option")]
    pub knockout_start_time: Option<NaiveTime>,
}

impl Competition {
    /// New competition in Setup with a default roster sized by `settings.num_teams`.
    pub fn new(settings: Settings) -> Self {
        let team_names = default_team_names(settings.num_teams.min(MAX_TEAMS) as usize);
        Self {
            id: Uuid::new_v4(),
            settings,
            team_names,
            tournament: None,
            knockout_matches: Vec::new(),
            knockout_start_time: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.tournament.is_none() {
            return Phase::Setup;
        }
        if self.knockout_matches.is_empty() {
            return Phase::GroupStage;
        }
        let final_decided = self
            .knockout_matches
            .iter()
            .any(|m| m.next_match_id.is_none() && m.completed);
        if final_decided {
            Phase::Completed
        } else {
            Phase::Knockout
        }
    }

    /// Generated group stage, or `InvalidInput` while still in Setup.
    pub fn tournament_mut(&mut self) -> Result<&mut Tournament, TournamentError> {
        self.tournament
            .as_mut()
            .ok_or_else(|| TournamentError::InvalidInput("no tournament has been generated yet".into()))
    }

    pub fn get_knockout_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.knockout_matches.iter().find(|m| m.id == id)
    }

    /// Replace settings. Validated first; the roster is left alone.
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), TournamentError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Back to default settings (roster and generated data are kept).
    pub fn reset_settings(&mut self) {
        self.settings = Settings::default();
    }

    /// Replace the roster with `n` default names (only valid in Setup).
    pub fn initialize_team_names(&mut self, n: u32) -> Result<(), TournamentError> {
        self.require_setup()?;
        check_roster_size(n as usize)?;
        self.settings.num_teams = n;
        self.team_names = default_team_names(n as usize);
        Ok(())
    }

    /// Replace the roster (only valid in Setup). Names are trimmed and must be unique.
    pub fn set_team_names(&mut self, names: &[String]) -> Result<(), TournamentError> {
        self.require_setup()?;
        check_roster_size(names.len())?;
        let mut cleaned: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = validate_team_name(name)?;
            if cleaned.contains(&name) {
                return Err(TournamentError::DuplicateTeamName(name));
            }
            cleaned.push(name);
        }
        self.settings.num_teams = cleaned.len() as u32;
        self.team_names = cleaned;
        Ok(())
    }

    /// Rename a team everywhere it appears: roster, groups, group matches and
    /// knockout matches (both slots and recorded winner).
    pub fn rename_team(&mut self, old_name: &str, new_name: &str) -> Result<(), TournamentError> {
        let new_name = validate_team_name(new_name)?;
        let idx = self
            .team_names
            .iter()
            .position(|t| t == old_name)
            .ok_or_else(|| TournamentError::TeamNotFound(old_name.to_string()))?;
        if new_name == old_name {
            return Ok(());
        }
        if self.team_names.contains(&new_name) {
            return Err(TournamentError::DuplicateTeamName(new_name));
        }

        self.team_names[idx] = new_name.clone();

        let rename = |s: &mut String| {
            if s == old_name {
                *s = new_name.clone();
            }
        };
        if let Some(tournament) = &mut self.tournament {
            tournament.groups.iter_mut().flatten().for_each(rename);
            for m in &mut tournament.matches {
                rename(&mut m.team1);
                rename(&mut m.team2);
            }
        }
        for m in &mut self.knockout_matches {
            rename(&mut m.team1);
            rename(&mut m.team2);
            if let Some(w) = &mut m.winner {
                rename(w);
            }
        }
        log::info!("Renamed team '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Discard the group stage and bracket; settings and roster stay.
    pub fn reset(&mut self) {
        self.tournament = None;
        self.knockout_matches.clear();
        self.knockout_start_time = None;
    }

    /// Discard only the bracket.
    pub fn reset_knockout(&mut self) {
        self.knockout_matches.clear();
    }

    fn require_setup(&self) -> Result<(), TournamentError> {
        if self.phase() != Phase::Setup {
            return Err(TournamentError::InvalidInput(
                "the roster is fixed once the tournament is generated; rename teams instead".into(),
            ));
        }
        Ok(())
    }
}

fn check_roster_size(n: usize) -> Result<(), TournamentError> {
    if n > MAX_TEAMS as usize {
        return Err(TournamentError::InvalidInput(format!(
            "at most {MAX_TEAMS} teams are supported (got {n})"
        )));
    }
    Ok(())
}
