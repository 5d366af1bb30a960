//! Snapshot persistence and repair of damaged stored data.

use dart_scheduler_web::{
    decode_competition, generate_tournament, Competition, FileStore, Phase, Settings, SnapshotWriter,
};
use std::path::PathBuf;
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("dart-scheduler-test-{}", Uuid::new_v4()))
}

fn stored_json(tournament: &str) -> String {
    format!(
        r#"{{
            "id": "{}",
            "team_names": ["A", "B"],
            "tournament": {}
        }}"#,
        Uuid::new_v4(),
        tournament
    )
}

#[test]
fn missing_group_stage_fields_are_repaired() {
    let c = decode_competition(&stored_json("{}")).unwrap();
    let t = c.tournament.unwrap();
    assert!(t.groups.is_empty());
    assert!(t.matches.is_empty());
}

#[test]
fn wrongly_typed_group_stage_fields_are_repaired() {
    let c = decode_competition(&stored_json(r#"{"groups": null, "matches": "oops"}"#)).unwrap();
    let t = c.tournament.unwrap();
    assert!(t.groups.is_empty());
    assert!(t.matches.is_empty());
    assert_eq!(c.team_names, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn unreadable_tournament_falls_back_to_setup() {
    let c = decode_competition(&stored_json(r#""not a tournament""#)).unwrap();
    assert_eq!(c.phase(), Phase::Setup);
    assert_eq!(c.settings, Settings::default());
}

#[test]
fn garbage_is_an_error() {
    assert!(decode_competition("not json").is_err());
}

#[tokio::test]
async fn snapshot_round_trip() {
    let store = FileStore::new(scratch_dir());
    let mut c = Competition::new(Settings::default());
    generate_tournament(&mut c).unwrap();

    store.save(&c).await.unwrap();
    let loaded = store.load(c.id).await.unwrap().expect("snapshot should exist");

    assert_eq!(serde_json::to_value(&loaded).unwrap(), serde_json::to_value(&c).unwrap());
    assert_eq!(loaded.phase(), Phase::GroupStage);

    store.remove(c.id).await.unwrap();
    assert!(store.load(c.id).await.unwrap().is_none());
    // Removing twice is fine.
    store.remove(c.id).await.unwrap();

    tokio::fs::remove_dir_all(store.dir()).await.unwrap();
}

#[tokio::test]
async fn load_all_skips_unreadable_files() {
    let store = FileStore::new(scratch_dir());
    assert!(store.load_all().await.unwrap().is_empty());

    let first = Competition::new(Settings::default());
    let second = Competition::new(Settings::default());
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();
    tokio::fs::write(store.dir().join("broken.json"), "{").await.unwrap();
    tokio::fs::write(store.dir().join("notes.txt"), "ignored").await.unwrap();

    let mut ids: Vec<Uuid> = store.load_all().await.unwrap().into_iter().map(|c| c.id).collect();
    ids.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(ids, expected);

    tokio::fs::remove_dir_all(store.dir()).await.unwrap();
}

#[tokio::test]
async fn latest_queued_snapshot_wins() {
    let writer = SnapshotWriter::spawn(FileStore::new(scratch_dir()));
    let mut c = Competition::new(Settings::default());

    for name in ["first", "second", "third"] {
        c.settings.tournament_name = name.to_string();
        writer.save(c.clone());
    }
    writer.flush().await.unwrap();

    let loaded = writer.files().load(c.id).await.unwrap().expect("snapshot should exist");
    assert_eq!(loaded.settings.tournament_name, "third");

    tokio::fs::remove_dir_all(writer.files().dir()).await.unwrap();
}

#[tokio::test]
async fn removal_is_not_undone_by_earlier_saves() {
    let writer = SnapshotWriter::spawn(FileStore::new(scratch_dir()));
    let kept = Competition::new(Settings::default());
    let removed = Competition::new(Settings::default());

    writer.save(kept.clone());
    writer.save(removed.clone());
    writer.remove(removed.id).await.unwrap();
    writer.flush().await.unwrap();

    assert!(writer.files().load(removed.id).await.unwrap().is_none());
    assert!(writer.files().load(kept.id).await.unwrap().is_some());

    tokio::fs::remove_dir_all(writer.files().dir()).await.unwrap();
}
