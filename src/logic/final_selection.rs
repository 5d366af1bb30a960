//! Final selection: pick the top finishers of each group for the knockout stage.

use crate::logic::standings::all_standings;
use crate::models::{AdvancingTeam, Standing, Tournament, TournamentError};

/// Top `advance_count` teams of each group's sorted standings.
/// `standings[i]` belongs to group `i + 1`.
pub fn select_advancers(standings: &[Vec<Standing>], advance_count: u32) -> Vec<AdvancingTeam> {
    standings
        .iter()
        .enumerate()
        .flat_map(|(g, table)| {
            table
                .iter()
                .take(advance_count as usize)
                .enumerate()
                .map(move |(pos, s)| AdvancingTeam {
                    name: s.name.clone(),
                    group: g as u32 + 1,
                    position: pos as u32 + 1,
                })
        })
        .collect()
}

/// Qualifiers of a finished group stage.
///
/// Fails with `InsufficientData` while any group match is unscored or when
/// nobody qualifies.
pub fn advancing_teams(tournament: &Tournament, advance_count: u32) -> Result<Vec<AdvancingTeam>, TournamentError> {
    if !tournament.is_group_stage_complete() {
        return Err(TournamentError::InsufficientData(format!(
            "Please complete all group stage matches first ({} of {} played).",
            tournament.completed_count(),
            tournament.matches.len()
        )));
    }
    let advancers = select_advancers(&all_standings(tournament), advance_count);
    if advancers.is_empty() {
        return Err(TournamentError::InsufficientData(
            "No teams available to advance to the knockout stage.".into(),
        ));
    }
    Ok(advancers)
}
