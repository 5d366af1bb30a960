//! CSV in and out: team roster import, schedule export.

use crate::models::{format_clock, GameMatch};
use serde::Serialize;
use std::io::Read;

/// Team names from CSV: first column of each row, blank rows skipped.
/// A leading "team"/"name" header row is dropped.
pub fn read_team_names<R: Read>(reader: R) -> Result<Vec<String>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(name) = record.get(0).filter(|s| !s.is_empty()) else {
            continue;
        };
        if i == 0 && (name.eq_ignore_ascii_case("team") || name.eq_ignore_ascii_case("name")) {
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

#[derive(Serialize)]
struct ScheduleRow<'a> {
    id: u32,
    stage: String,
    time: String,
    board: u32,
    team1: &'a str,
    team2: &'a str,
    score1: Option<u32>,
    score2: Option<u32>,
    completed: bool,
}

/// Matches as CSV with a header row; stage is "Group N" or "Round N".
pub fn schedule_csv(matches: &[GameMatch]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for m in matches {
        let stage = match (m.group, m.round) {
            (Some(g), _) => format!("Group {g}"),
            (None, Some(r)) => format!("Round {r}"),
            (None, None) => String::new(),
        };
        wtr.serialize(ScheduleRow {
            id: m.id,
            stage,
            time: format_clock(m.time),
            board: m.board,
            team1: &m.team1,
            team2: &m.team2,
            score1: m.score1,
            score2: m.score2,
            completed: m.completed,
        })?;
    }
    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
