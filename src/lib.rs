//! Dart tournament scheduler: library with models, scheduling/bracket logic and storage.

pub mod logic;
pub mod models;
pub mod storage;

pub use logic::{
    adjust_match_score, advancing_teams, all_standings, build_bracket, calculate_standings, champion,
    clear_match_score, create_knockout_stage, generate_tournament, generate_tournament_with, group_standings,
    knockout_rounds, partition_into_groups, partition_into_groups_with, propagate_winner, read_team_names,
    record_knockout_score, record_match_score, record_result, round_name, round_robin, schedule, schedule_csv,
    select_advancers, team_schedule, KnockoutRound, KnockoutTimeModel, TeamFixture,
};
pub use models::{
    default_team_names, format_clock, parse_clock, parse_placeholder, placeholder_for, AdvancingTeam, Competition,
    CompetitionId, GameMatch, MatchId, Pairing, Phase, Settings, Slot, Standing, Tournament, TournamentError, MAX_BOARDS,
    MAX_MATCH_MINUTES, MAX_TEAMS,
};
pub use storage::{decode_competition, FileStore, SnapshotWriter, StorageError};
