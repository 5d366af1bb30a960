//! Setup phase: split the roster into groups and generate the group stage.

use crate::logic::group_play::{round_robin, schedule};
use crate::models::{add_clock, Competition, Pairing, Tournament, TournamentError};
use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Gap between the last group match ending and the suggested knockout start.
const KNOCKOUT_BREAK_MINUTES: i64 = 30;

/// Split `teams` into `num_groups` groups of near-equal size (shuffled).
///
/// The first `n % num_groups` groups get one extra team.
pub fn partition_into_groups(teams: &[String], num_groups: u32) -> Result<Vec<Vec<String>>, TournamentError> {
    partition_into_groups_with(teams, num_groups, &mut rand::thread_rng())
}

/// [`partition_into_groups`] with a caller-supplied rng.
pub fn partition_into_groups_with<R: Rng + ?Sized>(
    teams: &[String],
    num_groups: u32,
    rng: &mut R,
) -> Result<Vec<Vec<String>>, TournamentError> {
    if teams.is_empty() {
        return Err(TournamentError::InvalidInput("no teams to place into groups".into()));
    }
    if num_groups < 1 {
        return Err(TournamentError::InvalidInput("at least one group is required".into()));
    }
    let num_groups = num_groups as usize;
    if num_groups > teams.len() {
        return Err(TournamentError::InvalidInput(format!(
            "{} groups requested for only {} teams",
            num_groups,
            teams.len()
        )));
    }

    let mut shuffled = teams.to_vec();
    shuffled.shuffle(rng);

    let base = shuffled.len() / num_groups;
    let remainder = shuffled.len() % num_groups;
    let mut remaining = shuffled.into_iter();
    let groups = (0..num_groups)
        .map(|i| {
            let size = if i < remainder { base + 1 } else { base };
            remaining.by_ref().take(size).collect()
        })
        .collect();
    Ok(groups)
}

/// Generate groups and the board schedule from the competition's roster and settings.
///
/// Replaces any existing group stage and clears the bracket.
pub fn generate_tournament(competition: &mut Competition) -> Result<(), TournamentError> {
    generate_tournament_with(competition, &mut rand::thread_rng())
}

/// [`generate_tournament`] with a caller-supplied rng for the group draw.
pub fn generate_tournament_with<R: Rng + ?Sized>(
    competition: &mut Competition,
    rng: &mut R,
) -> Result<(), TournamentError> {
    let settings = &competition.settings;
    settings.validate()?;

    let teams = &competition.team_names;
    if teams.len() < 2 {
        return Err(TournamentError::InvalidInput(
            "There are not enough teams to generate a tournament.".into(),
        ));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = teams.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(TournamentError::DuplicateTeamName(dup.clone()));
    }

    let groups = partition_into_groups_with(teams, settings.num_groups, rng)?;
    let pairings: Vec<Vec<Pairing>> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            if group.len() < 2 {
                log::warn!("Group {} has less than 2 teams, skipping match generation", i + 1);
            }
            round_robin(group)
        })
        .collect();

    let match_length = settings.match_length();
    let matches = schedule(&pairings, settings.num_boards, settings.start_time, match_length)?;

    // Matches come back ordered by slot, so the last one ends the group stage.
    let knockout_start = matches
        .last()
        .map(|m| add_clock(m.time, match_length + Duration::minutes(KNOCKOUT_BREAK_MINUTES)));

    log::info!(
        "Generated tournament with {} teams, {} groups, {} boards ({} matches)",
        teams.len(),
        groups.len(),
        settings.num_boards,
        matches.len()
    );

    competition.tournament = Some(Tournament::new(groups, matches));
    competition.knockout_matches.clear();
    competition.knockout_start_time = knockout_start;
    Ok(())
}
