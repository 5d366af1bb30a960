//! Group tables computed from completed matches.

use crate::models::{GameMatch, Standing, Tournament};

/// Standings for `group_teams`, counting only completed matches between two of them.
///
/// Sorted by points, then leg difference, both descending. The sort is stable, so
/// teams level on both keep their roster order.
pub fn calculate_standings<'a>(
    group_teams: &[String],
    matches: impl IntoIterator<Item = &'a GameMatch>,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = group_teams.iter().map(Standing::new).collect();

    for m in matches {
        if !m.completed {
            continue;
        }
        let (Some(s1), Some(s2)) = (m.score1, m.score2) else {
            continue;
        };
        let i1 = standings.iter().position(|s| s.name == m.team1);
        let i2 = standings.iter().position(|s| s.name == m.team2);
        let (Some(i1), Some(i2)) = (i1, i2) else {
            continue;
        };
        standings[i1].add_result(s1, s2);
        standings[i2].add_result(s2, s1);
    }

    standings.sort_by(|a, b| b.points.cmp(&a.points).then(b.leg_diff.cmp(&a.leg_diff)));
    standings
}

/// Standings of 1-based `group`; empty if there is no such group.
pub fn group_standings(tournament: &Tournament, group: u32) -> Vec<Standing> {
    let Some(teams) = (group as usize)
        .checked_sub(1)
        .and_then(|i| tournament.groups.get(i))
    else {
        return Vec::new();
    };
    calculate_standings(teams, tournament.group_matches(group))
}

/// Standings of every group, in group order.
pub fn all_standings(tournament: &Tournament) -> Vec<Vec<Standing>> {
    (1..=tournament.groups.len() as u32)
        .map(|g| group_standings(tournament, g))
        .collect()
}
