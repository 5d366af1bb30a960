//! Knockout stage: seeded single-elimination bracket, result entry and winner propagation.

use crate::logic::final_selection::advancing_teams;
use crate::models::{
    add_clock, placeholder_for, AdvancingTeam, Competition, GameMatch, MatchId, Slot, TournamentError,
};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gap between the starts of consecutive knockout rounds.
const ROUND_GAP_MINUTES: i64 = 60;

/// How knockout match times are derived.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KnockoutTimeModel {
    /// Start of the first round.
    pub base: NaiveTime,
    pub match_duration: Duration,
}

impl KnockoutTimeModel {
    pub fn new(base: NaiveTime, match_duration: Duration) -> Self {
        Self { base, match_duration }
    }

    /// Start right after `total_group_matches` back-to-back group matches.
    pub fn after_group_stage(group_start: NaiveTime, total_group_matches: usize, match_duration: Duration) -> Self {
        Self::new(add_clock(group_start, match_duration * total_group_matches as i32), match_duration)
    }

    /// Explicit knockout start if one is recorded, otherwise after the group stage.
    pub fn for_competition(competition: &Competition) -> Self {
        let duration = competition.settings.match_length();
        match competition.knockout_start_time {
            Some(start) => Self::new(start, duration),
            None => {
                let total = competition.tournament.as_ref().map_or(0, |t| t.matches.len());
                Self::after_group_stage(competition.settings.start_time, total, duration)
            }
        }
    }

    /// `base + (round-1)*60min + index_in_round*match_duration`.
    pub fn time_for(&self, round: u32, index_in_round: usize) -> NaiveTime {
        let offset = Duration::minutes(ROUND_GAP_MINUTES * (i64::from(round) - 1))
            + self.match_duration * index_in_round as i32;
        add_clock(self.base, offset)
    }
}

/// A round-1 position: a real match or a team with a bye.
enum Entry {
    Bye(String),
    Pair(String, String),
}

/// What fills a slot of a later-round match.
enum Feed {
    Team(String),
    Winner(MatchId),
}

impl Feed {
    fn label(&self) -> String {
        match self {
            Feed::Team(name) => name.clone(),
            Feed::Winner(id) => placeholder_for(*id),
        }
    }
}

/// Build a single-elimination bracket from the group qualifiers.
///
/// Qualifiers are seeded by (group, position) and paired best against worst over a
/// field padded to the next power of two. Seeds whose opponent would fall in the
/// padding get a bye: no round-1 match, the team goes straight into its round-2
/// slot. Byes alternate with real round-1 matches so a bye team meets a round-1
/// winner where possible. Later rounds pair consecutive feeds and show
/// "Winner of Match {id}" until the upstream result is in.
pub fn build_bracket(
    advancers: &[AdvancingTeam],
    num_boards: u32,
    times: &KnockoutTimeModel,
) -> Result<Vec<GameMatch>, TournamentError> {
    if advancers.len() < 2 {
        return Err(TournamentError::InsufficientData(format!(
            "at least two qualifying teams are needed for a bracket (got {})",
            advancers.len()
        )));
    }
    if num_boards < 1 {
        return Err(TournamentError::InvalidInput("at least one board is required".into()));
    }

    let mut seeded = advancers.to_vec();
    seeded.sort_by_key(|t| (t.group, t.position));
    let bracket_size = seeded.len().next_power_of_two();

    let mut byes = Vec::new();
    let mut pairs = Vec::new();
    for i in 0..bracket_size / 2 {
        let j = bracket_size - 1 - i;
        match seeded.get(j) {
            Some(worst) => pairs.push(Entry::Pair(seeded[i].name.clone(), worst.name.clone())),
            None => byes.push(Entry::Bye(seeded[i].name.clone())),
        }
    }
    let bye_count = byes.len();
    let mut byes = byes.into_iter();
    let mut pairs = pairs.into_iter();
    let mut entries = Vec::with_capacity(bracket_size / 2);
    loop {
        let (bye, pair) = (byes.next(), pairs.next());
        if bye.is_none() && pair.is_none() {
            break;
        }
        entries.extend(bye);
        entries.extend(pair);
    }

    let board_for = |index: usize| (index % num_boards as usize) as u32 + 1;
    let mut matches: Vec<GameMatch> = Vec::new();
    let mut next_id: MatchId = 1;
    let mut feeds: Vec<Feed> = Vec::with_capacity(entries.len());

    let mut index_in_round = 0;
    for entry in entries {
        match entry {
            Entry::Bye(name) => feeds.push(Feed::Team(name)),
            Entry::Pair(team1, team2) => {
                matches.push(GameMatch::knockout(
                    next_id,
                    1,
                    team1,
                    team2,
                    times.time_for(1, index_in_round),
                    board_for(index_in_round),
                ));
                feeds.push(Feed::Winner(next_id));
                next_id += 1;
                index_in_round += 1;
            }
        }
    }

    let mut round = 1;
    while feeds.len() > 1 {
        round += 1;
        let mut next_feeds = Vec::with_capacity(feeds.len() / 2);
        for (i, pair) in feeds.chunks(2).enumerate() {
            let id = next_id;
            next_id += 1;
            let team2 = pair.get(1).map_or_else(String::new, Feed::label);
            matches.push(GameMatch::knockout(
                id,
                round,
                pair[0].label(),
                team2,
                times.time_for(round, i),
                board_for(i),
            ));
            for (k, feed) in pair.iter().enumerate() {
                if let Feed::Winner(upstream) = feed {
                    if let Some(m) = matches.iter_mut().find(|m| m.id == *upstream) {
                        m.next_match_id = Some(id);
                        m.next_match_position = Some(if k == 0 { Slot::Team1 } else { Slot::Team2 });
                    }
                }
            }
            next_feeds.push(Feed::Winner(id));
        }
        feeds = next_feeds;
    }

    log::info!(
        "Created knockout bracket with {} advancing teams ({} matches, {} byes, {} rounds)",
        seeded.len(),
        matches.len(),
        bye_count,
        round
    );
    Ok(matches)
}

/// Build (or rebuild) the competition's bracket from current standings.
pub fn create_knockout_stage(competition: &mut Competition) -> Result<(), TournamentError> {
    let tournament = competition
        .tournament
        .as_ref()
        .ok_or_else(|| TournamentError::InsufficientData("No tournament data is available.".into()))?;
    let advancers = advancing_teams(tournament, competition.settings.teams_advancing)?;
    let times = KnockoutTimeModel::for_competition(competition);
    let bracket = build_bracket(&advancers, competition.settings.num_boards, &times)?;
    competition.knockout_matches = bracket;
    Ok(())
}

/// Record a knockout result and push the winner up the bracket.
///
/// Ties are rejected with `InvalidScore`; matches still waiting on an upstream
/// winner are rejected with `MatchNotReady`. Nothing changes on error.
pub fn record_result(
    matches: &mut [GameMatch],
    match_id: MatchId,
    score1: u32,
    score2: u32,
) -> Result<(), TournamentError> {
    let m = matches
        .iter_mut()
        .find(|m| m.id == match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if !m.is_knockout() {
        return Err(TournamentError::InvalidInput(format!("match {match_id} is not a knockout match")));
    }
    if score1 == score2 {
        return Err(TournamentError::InvalidScore { match_id });
    }
    if !m.is_ready() {
        return Err(TournamentError::MatchNotReady(match_id));
    }

    let winner = if score1 > score2 { m.team1.clone() } else { m.team2.clone() };
    m.score1 = Some(score1);
    m.score2 = Some(score2);
    m.completed = true;
    m.winner = Some(winner.clone());

    propagate_winner(matches, match_id, &winner);
    Ok(())
}

/// [`record_result`] on the competition's bracket.
pub fn record_knockout_score(
    competition: &mut Competition,
    match_id: MatchId,
    score1: u32,
    score2: u32,
) -> Result<(), TournamentError> {
    record_result(&mut competition.knockout_matches, match_id, score1, score2)
}

/// Write `winner` into the slot the completed match feeds, and keep going while the
/// receiving match was itself already completed (its winner is re-read from its
/// scores against the new names). Stops at the final.
pub fn propagate_winner(matches: &mut [GameMatch], completed_match_id: MatchId, winner: &str) {
    let mut current = completed_match_id;
    let mut winner = winner.to_string();

    // Each step moves one round closer to the final.
    for _ in 0..matches.len() {
        let Some(source) = matches.iter().find(|m| m.id == current) else {
            return;
        };
        let (Some(next_id), Some(position)) = (source.next_match_id, source.next_match_position) else {
            return;
        };
        let Some(target) = matches.iter_mut().find(|m| m.id == next_id) else {
            log::warn!("Match {} feeds missing match {}", current, next_id);
            return;
        };
        target.set_team(position, winner);
        if !target.completed {
            return;
        }
        let Some(derived) = target.winner_by_score().map(str::to_string) else {
            return;
        };
        log::debug!("Match {} already played, re-propagating '{}'", next_id, derived);
        target.winner = Some(derived.clone());
        current = next_id;
        winner = derived;
    }
}

/// Display name of a round, counted back from the final.
pub fn round_name(round: u32, total_rounds: u32) -> String {
    match total_rounds.checked_sub(round) {
        Some(0) => "Final".to_string(),
        Some(1) => "Semi-Finals".to_string(),
        Some(2) => "Quarter-Finals".to_string(),
        Some(3) => "Round of 16".to_string(),
        Some(4) => "Round of 32".to_string(),
        _ => format!("Round {round}"),
    }
}

/// One round of the bracket for display.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutRound {
    pub round: u32,
    pub name: String,
    pub matches: Vec<GameMatch>,
}

/// Bracket grouped by round, first round first.
pub fn knockout_rounds(matches: &[GameMatch]) -> Vec<KnockoutRound> {
    let mut by_round: BTreeMap<u32, Vec<GameMatch>> = BTreeMap::new();
    for m in matches {
        if let Some(round) = m.round {
            by_round.entry(round).or_default().push(m.clone());
        }
    }
    let total_rounds = by_round.keys().next_back().copied().unwrap_or(0);
    by_round
        .into_iter()
        .map(|(round, matches)| KnockoutRound {
            round,
            name: round_name(round, total_rounds),
            matches,
        })
        .collect()
}

/// Winner of the final, once it is played.
pub fn champion(matches: &[GameMatch]) -> Option<&str> {
    matches
        .iter()
        .find(|m| m.is_knockout() && m.next_match_id.is_none() && m.completed)
        .and_then(|m| m.winner.as_deref())
}
