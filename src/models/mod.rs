//! Data structures for the dart tournament: matches, groups, standings, settings, competition state.

pub mod clock;
mod competition;
mod game;
mod settings;
mod team;
mod tournament;

pub use clock::{add_clock, format_clock, parse_clock};
pub use competition::{Competition, CompetitionId};
pub use game::{parse_placeholder, placeholder_for, GameMatch, MatchId, Pairing, Slot};
pub use settings::{Settings, MAX_BOARDS, MAX_MATCH_MINUTES, MAX_TEAMS};
pub use team::{default_team_names, validate_team_name, AdvancingTeam, Standing};
pub use tournament::{Phase, Tournament, TournamentError};
