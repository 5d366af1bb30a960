//! Group stage: round-robin pairings, board/time scheduling, and score entry.

use crate::models::{add_clock, GameMatch, MatchId, Pairing, Slot, Tournament, TournamentError};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Every team in `teams` against every other exactly once: k*(k-1)/2 pairings.
pub fn round_robin(teams: &[String]) -> Vec<Pairing> {
    teams
        .iter()
        .enumerate()
        .flat_map(|(i, a)| teams[i + 1..].iter().map(move |b| Pairing::new(a.clone(), b.clone())))
        .collect()
}

/// A pairing that has been given a slot and a board.
struct Placement {
    slot: usize,
    board: u32,
    group: u32,
    pairing: Pairing,
}

/// Scheduling bookkeeping: when each team last played and what has been placed.
#[derive(Default)]
struct Planner {
    /// Slot index of each team's latest match; absent means never played (-1).
    last_played: HashMap<String, i64>,
    placed: Vec<Placement>,
}

impl Planner {
    fn rest(&self, team: &str, slot: usize) -> i64 {
        slot as i64 - self.last_played.get(team).copied().unwrap_or(-1)
    }

    /// Rest of the less-rested team of the pairing.
    fn rest_score(&self, pairing: &Pairing, slot: usize) -> i64 {
        self.rest(&pairing.team1, slot).min(self.rest(&pairing.team2, slot))
    }

    /// Index and score of the most rested pairing whose teams are both free.
    /// On equal scores the earliest pairing wins.
    fn pick(&self, pending: &[Pairing], slot: usize, busy: &HashSet<String>) -> Option<(usize, i64)> {
        pending
            .iter()
            .enumerate()
            .filter(|(_, p)| !busy.contains(&p.team1) && !busy.contains(&p.team2))
            .map(|(i, p)| (i, self.rest_score(p, slot)))
            .min_by_key(|&(_, score)| Reverse(score))
    }

    fn place(&mut self, slot: usize, board: u32, group: u32, pairing: Pairing, busy: &mut HashSet<String>) {
        for team in [&pairing.team1, &pairing.team2] {
            busy.insert(team.clone());
            self.last_played.insert(team.clone(), slot as i64);
        }
        self.placed.push(Placement {
            slot,
            board,
            group,
            pairing,
        });
    }
}

/// Assign every pairing a time slot and a board.
///
/// `groups[i]` holds the pairings of group `i + 1`. Slots start at `start_time` and
/// are `match_duration` apart. Within a slot each board is used once and each team
/// plays at most once. Boards are filled by rotating through blocks of groups and
/// then from any group, always taking the pairing whose teams have rested longest.
/// A slot with no playable pairing left closes early.
///
/// The result is ordered by (time, board) with ids 1..N in that order.
pub fn schedule(
    groups: &[Vec<Pairing>],
    num_boards: u32,
    start_time: NaiveTime,
    match_duration: Duration,
) -> Result<Vec<GameMatch>, TournamentError> {
    if num_boards < 1 {
        return Err(TournamentError::InvalidInput("at least one board is required".into()));
    }
    if match_duration <= Duration::zero() {
        return Err(TournamentError::InvalidInput("match duration must be positive".into()));
    }
    if let Some(p) = groups.iter().flatten().find(|p| p.team1 == p.team2) {
        return Err(TournamentError::InvalidInput(format!("'{}' cannot play itself", p.team1)));
    }

    let boards = num_boards as usize;
    let num_groups = groups.len();
    let mut pending: Vec<Vec<Pairing>> = groups.to_vec();
    let mut planner = Planner::default();
    let mut block_start = 0usize;
    let mut slot = 0usize;

    while pending.iter().any(|g| !g.is_empty()) {
        let mut busy = HashSet::new();
        let mut boards_used = 0usize;

        // One pick per group of the current block; pass 2 covers boards beyond the group count.
        for i in 0..boards.min(num_groups) {
            let g = (block_start + i) % num_groups;
            if let Some((idx, _)) = planner.pick(&pending[g], slot, &busy) {
                let pairing = pending[g].remove(idx);
                boards_used += 1;
                planner.place(slot, boards_used as u32, g as u32 + 1, pairing, &mut busy);
            }
        }

        // Fill idle boards from any group, looking at the next block first.
        let next_block = (block_start + boards) % num_groups;
        while boards_used < boards {
            let best = (0..num_groups)
                .map(|k| (next_block + k) % num_groups)
                .filter_map(|g| planner.pick(&pending[g], slot, &busy).map(|(idx, score)| (g, idx, score)))
                .min_by_key(|&(_, _, score)| Reverse(score));
            let Some((g, idx, _)) = best else { break };
            let pairing = pending[g].remove(idx);
            boards_used += 1;
            planner.place(slot, boards_used as u32, g as u32 + 1, pairing, &mut busy);
        }

        log::debug!("Slot {}: {} of {} boards in use", slot, boards_used, boards);
        block_start = next_block;
        slot += 1;
    }

    let mut placed = planner.placed;
    placed.sort_by_key(|p| (p.slot, p.board));
    let matches = placed
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let time = add_clock(start_time, match_duration * p.slot as i32);
            GameMatch::group_stage(i as MatchId + 1, p.group, p.pairing, time, p.board)
        })
        .collect();
    Ok(matches)
}

/// Record a group match result. Draws are allowed.
pub fn record_match_score(
    tournament: &mut Tournament,
    match_id: MatchId,
    score1: u32,
    score2: u32,
) -> Result<(), TournamentError> {
    let m = tournament
        .get_match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.score1 = Some(score1);
    m.score2 = Some(score2);
    m.completed = true;
    Ok(())
}

/// Bump one side's score by `delta` (clamped to the `u32` range) and mark the match played.
/// An unset opposite score becomes 0.
pub fn adjust_match_score(
    tournament: &mut Tournament,
    match_id: MatchId,
    side: Slot,
    delta: i32,
) -> Result<(), TournamentError> {
    let m = tournament
        .get_match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let bump = |score: Option<u32>| score.unwrap_or(0).saturating_add_signed(delta);
    match side {
        Slot::Team1 => {
            m.score1 = Some(bump(m.score1));
            m.score2 = Some(m.score2.unwrap_or(0));
        }
        Slot::Team2 => {
            m.score2 = Some(bump(m.score2));
            m.score1 = Some(m.score1.unwrap_or(0));
        }
    }
    m.completed = true;
    Ok(())
}

/// Clear a group match result.
pub fn clear_match_score(tournament: &mut Tournament, match_id: MatchId) -> Result<(), TournamentError> {
    let m = tournament
        .get_match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.score1 = None;
    m.score2 = None;
    m.completed = false;
    Ok(())
}

/// One entry of a team's personal schedule.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamFixture {
    pub match_id: MatchId,
    #[serde(with = "crate::models::clock::hhmm")]
    pub time: NaiveTime,
    pub opponent: String,
    pub board: u32,
    pub completed: bool,
    /// "legs-for - legs-against" from this team's side, once played.
    pub result: Option<String>,
}

/// A team's group matches in playing order.
pub fn team_schedule(tournament: &Tournament, team: &str) -> Vec<TeamFixture> {
    let mut fixtures: Vec<TeamFixture> = tournament
        .matches
        .iter()
        .filter(|m| m.involves(team))
        .map(|m| {
            let is_team1 = m.team1 == team;
            let result = match (m.completed, m.score1, m.score2) {
                (true, Some(s1), Some(s2)) if is_team1 => Some(format!("{s1}-{s2}")),
                (true, Some(s1), Some(s2)) => Some(format!("{s2}-{s1}")),
                _ => None,
            };
            TeamFixture {
                match_id: m.id,
                time: m.time,
                opponent: if is_team1 { m.team2.clone() } else { m.team1.clone() },
                board: m.board,
                completed: m.completed,
                result,
            }
        })
        .collect();
    // Ids follow playing order; wall-clock times may wrap past midnight.
    fixtures.sort_by_key(|f| f.match_id);
    fixtures
}
