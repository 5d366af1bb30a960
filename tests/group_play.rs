//! Integration tests for the group stage: partition, round-robin, board scheduling and score entry.

use chrono::{Duration, NaiveTime};
use dart_scheduler_web::models::add_clock;
use dart_scheduler_web::{
    adjust_match_score, clear_match_score, generate_tournament_with, parse_clock, partition_into_groups,
    partition_into_groups_with, record_match_score, round_robin, schedule, team_schedule, Competition, GameMatch,
    Pairing, Phase, Settings, Slot, TournamentError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn clock(s: &str) -> NaiveTime {
    parse_clock(s).unwrap()
}

fn assert_no_conflicts(matches: &[GameMatch]) {
    let mut boards = HashSet::new();
    let mut teams = HashSet::new();
    for m in matches {
        assert!(boards.insert((m.time, m.board)), "board {} double-booked at {}", m.board, m.time);
        assert!(teams.insert((m.time, m.team1.clone())), "{} plays twice at {}", m.team1, m.time);
        assert!(teams.insert((m.time, m.team2.clone())), "{} plays twice at {}", m.team2, m.time);
    }
}

#[test]
fn round_robin_pairs_every_team_once() {
    for k in 0usize..8 {
        let teams: Vec<String> = (0..k).map(|i| format!("T{i}")).collect();
        let pairs = round_robin(&teams);
        assert_eq!(pairs.len(), k * k.saturating_sub(1) / 2);

        let mut seen = HashSet::new();
        for p in &pairs {
            assert_ne!(p.team1, p.team2);
            let key = if p.team1 < p.team2 {
                (p.team1.clone(), p.team2.clone())
            } else {
                (p.team2.clone(), p.team1.clone())
            };
            assert!(seen.insert(key), "duplicate pairing");
        }
    }
}

#[test]
fn partition_sizes_differ_by_at_most_one() {
    let teams: Vec<String> = (0..10).map(|i| format!("T{i}")).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let groups = partition_into_groups_with(&teams, 3, &mut rng).unwrap();

    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![4, 3, 3]);

    let placed: Vec<&String> = groups.iter().flatten().collect();
    assert_eq!(placed.len(), teams.len());
    let unique: HashSet<&String> = placed.into_iter().collect();
    assert_eq!(unique, teams.iter().collect());
}

#[test]
fn partition_rejects_bad_input() {
    let teams = names(&["A", "B", "C"]);
    assert!(matches!(partition_into_groups(&[], 1), Err(TournamentError::InvalidInput(_))));
    assert!(matches!(partition_into_groups(&teams, 0), Err(TournamentError::InvalidInput(_))));
    assert!(matches!(partition_into_groups(&teams, 4), Err(TournamentError::InvalidInput(_))));
    assert_eq!(partition_into_groups(&teams, 3).unwrap().len(), 3);
}

#[test]
fn four_teams_one_board_plays_six_separate_slots() {
    let pairs = round_robin(&names(&["A", "B", "C", "D"]));
    let matches = schedule(&[pairs], 1, clock("10:00"), Duration::minutes(10)).unwrap();

    assert_eq!(matches.len(), 6);
    assert_eq!(matches[0].time, clock("10:00"));
    let times: Vec<NaiveTime> = matches.iter().map(|m| m.time).collect();
    let expected: Vec<NaiveTime> = (0..6).map(|i| add_clock(clock("10:00"), Duration::minutes(10 * i))).collect();
    assert_eq!(times, expected);
    assert!(matches.iter().all(|m| m.board == 1 && m.group == Some(1)));
    assert_no_conflicts(&matches);
}

#[test]
fn most_rested_teams_play_next() {
    let pairs = round_robin(&names(&["A", "B", "C", "D"]));
    let matches = schedule(&[pairs], 1, clock("10:00"), Duration::minutes(10)).unwrap();

    // A and B just played, so the only fully rested pair goes next.
    assert_eq!((matches[0].team1.as_str(), matches[0].team2.as_str()), ("A", "B"));
    assert_eq!((matches[1].team1.as_str(), matches[1].team2.as_str()), ("C", "D"));
}

#[test]
fn two_boards_fill_every_slot_when_possible() {
    let pairs = round_robin(&names(&["A", "B", "C", "D"]));
    let matches = schedule(&[pairs], 2, clock("09:00"), Duration::minutes(15)).unwrap();

    assert_eq!(matches.len(), 6);
    let slots: HashSet<NaiveTime> = matches.iter().map(|m| m.time).collect();
    assert_eq!(slots.len(), 3);
    assert_no_conflicts(&matches);
}

#[test]
fn multi_group_schedule_is_complete_ordered_and_conflict_free() {
    let groups = vec![
        round_robin(&names(&["A1", "A2", "A3", "A4"])),
        round_robin(&names(&["B1", "B2", "B3"])),
        round_robin(&names(&["C1", "C2", "C3", "C4", "C5"])),
    ];
    let total: usize = groups.iter().map(Vec::len).sum();
    let matches = schedule(&groups, 3, clock("18:00"), Duration::minutes(20)).unwrap();

    assert_eq!(matches.len(), total);
    assert_no_conflicts(&matches);
    for (i, m) in matches.iter().enumerate() {
        assert_eq!(m.id as usize, i + 1);
        assert!(m.board >= 1 && m.board <= 3);
    }
    for w in matches.windows(2) {
        assert!((w[0].time, w[0].board) < (w[1].time, w[1].board));
    }

    let mut per_group: HashMap<u32, usize> = HashMap::new();
    for m in &matches {
        *per_group.entry(m.group.unwrap()).or_default() += 1;
    }
    assert_eq!(per_group[&1], 6);
    assert_eq!(per_group[&2], 3);
    assert_eq!(per_group[&3], 10);
}

#[test]
fn groups_too_small_for_a_match_contribute_nothing() {
    let groups = vec![round_robin(&names(&["Solo"])), round_robin(&names(&["A", "B"]))];
    let matches = schedule(&groups, 2, clock("10:00"), Duration::minutes(10)).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].group, Some(2));
}

#[test]
fn surplus_boards_stay_idle() {
    let groups = vec![round_robin(&names(&["A", "B", "C", "D"])), round_robin(&names(&["E", "F"]))];
    let matches = schedule(&groups, u32::MAX, clock("10:00"), Duration::minutes(10)).unwrap();

    assert_eq!(matches.len(), 7);
    assert!(matches.iter().all(|m| m.board <= 3));
    let slots: HashSet<NaiveTime> = matches.iter().map(|m| m.time).collect();
    assert_eq!(slots.len(), 3);
    assert_no_conflicts(&matches);
}

#[test]
fn schedule_rejects_bad_configuration() {
    let pairs = vec![round_robin(&names(&["A", "B"]))];
    assert!(matches!(
        schedule(&pairs, 0, clock("10:00"), Duration::minutes(10)),
        Err(TournamentError::InvalidInput(_))
    ));
    assert!(matches!(
        schedule(&pairs, 1, clock("10:00"), Duration::zero()),
        Err(TournamentError::InvalidInput(_))
    ));
    assert!(matches!(
        schedule(&[vec![Pairing::new("A", "A")]], 1, clock("10:00"), Duration::minutes(10)),
        Err(TournamentError::InvalidInput(_))
    ));
}

#[test]
fn generate_builds_groups_schedule_and_knockout_start() {
    let mut c = Competition::new(Settings::default());
    let mut rng = StdRng::seed_from_u64(42);
    generate_tournament_with(&mut c, &mut rng).unwrap();

    assert_eq!(c.phase(), Phase::GroupStage);
    let t = c.tournament.as_ref().unwrap();
    assert_eq!(t.groups.len(), 2);
    assert!(t.groups.iter().all(|g| g.len() == 4));
    assert_eq!(t.matches.len(), 12);
    assert_eq!(t.matches[0].time, clock("09:00"));
    assert_no_conflicts(&t.matches);

    let last = t.matches.last().unwrap();
    assert_eq!(
        c.knockout_start_time,
        Some(add_clock(last.time, Duration::minutes(15 + 30)))
    );
}

#[test]
fn generate_validates_before_touching_state() {
    let mut c = Competition::new(Settings::default());
    c.set_team_names(&names(&["Only"])).unwrap();
    assert!(matches!(
        generate_tournament_with(&mut c, &mut StdRng::seed_from_u64(1)),
        Err(TournamentError::InvalidInput(_))
    ));
    assert!(c.tournament.is_none());

    let mut c = Competition::new(Settings::default());
    c.settings.num_boards = 0;
    assert!(matches!(
        generate_tournament_with(&mut c, &mut StdRng::seed_from_u64(1)),
        Err(TournamentError::InvalidInput(_))
    ));
    assert!(c.tournament.is_none());
}

#[test]
fn score_entry_and_adjustment() {
    let mut c = Competition::new(Settings::default());
    generate_tournament_with(&mut c, &mut StdRng::seed_from_u64(3)).unwrap();
    let t = c.tournament_mut().unwrap();

    record_match_score(t, 1, 2, 2).unwrap();
    let m = t.get_match(1).unwrap();
    assert_eq!((m.score1, m.score2, m.completed), (Some(2), Some(2), true));

    adjust_match_score(t, 2, Slot::Team2, 1).unwrap();
    let m = t.get_match(2).unwrap();
    assert_eq!((m.score1, m.score2, m.completed), (Some(0), Some(1), true));

    adjust_match_score(t, 2, Slot::Team2, -5).unwrap();
    assert_eq!(t.get_match(2).unwrap().score2, Some(0));

    adjust_match_score(t, 3, Slot::Team1, i32::MAX).unwrap();
    adjust_match_score(t, 3, Slot::Team1, i32::MAX).unwrap();
    adjust_match_score(t, 3, Slot::Team1, 5).unwrap();
    assert_eq!(t.get_match(3).unwrap().score1, Some(u32::MAX));
    adjust_match_score(t, 3, Slot::Team1, i32::MIN).unwrap();
    assert_eq!(t.get_match(3).unwrap().score1, Some(u32::MAX - (1 << 31)));

    clear_match_score(t, 2).unwrap();
    let m = t.get_match(2).unwrap();
    assert_eq!((m.score1, m.score2, m.completed), (None, None, false));

    assert_eq!(record_match_score(t, 999, 1, 0), Err(TournamentError::MatchNotFound(999)));
}

#[test]
fn team_schedule_lists_results_from_the_teams_side() {
    let mut c = Competition::new(Settings::default());
    c.set_team_names(&names(&["A", "B", "C"])).unwrap();
    c.settings.num_groups = 1;
    c.settings.num_boards = 1;
    generate_tournament_with(&mut c, &mut StdRng::seed_from_u64(5)).unwrap();
    let t = c.tournament_mut().unwrap();

    let first = t.matches[0].clone();
    record_match_score(t, first.id, 3, 1).unwrap();

    let fixtures = team_schedule(t, &first.team2);
    assert_eq!(fixtures.len(), 2);
    assert_eq!(fixtures[0].match_id, first.id);
    assert_eq!(fixtures[0].opponent, first.team1);
    assert_eq!(fixtures[0].result.as_deref(), Some("1-3"));
    assert!(fixtures[1].result.is_none());
    assert!(fixtures[0].time < fixtures[1].time);
}
