//! Tournament business logic: setup, group play, standings, final selection, finals, roster I/O.

mod final_selection;
mod finals;
mod group_play;
mod roster;
mod setup;
mod standings;

pub use final_selection::{advancing_teams, select_advancers};
pub use finals::{
    build_bracket, champion, create_knockout_stage, knockout_rounds, propagate_winner, record_knockout_score,
    record_result, round_name, KnockoutRound, KnockoutTimeModel,
};
pub use group_play::{
    adjust_match_score, clear_match_score, record_match_score, round_robin, schedule, team_schedule, TeamFixture,
};
pub use roster::{read_team_names, schedule_csv};
pub use setup::{generate_tournament, generate_tournament_with, partition_into_groups, partition_into_groups_with};
pub use standings::{all_standings, calculate_standings, group_standings};
