// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Smoke tests for oaiserve-store-db.
//!
//! These tests verify the schema, the write cache and the set index using
//! in-memory and temporary on-disk databases.

use chrono::{DateTime, TimeZone, Utc};
use oaiserve_store_db::{
    Error, Metadata, OaiQuery, OpenMode, RecordSets, SCHEMA_VERSION, SetDescriptor, StoreDb,
};
use serde_json::json;

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn title(value: &str) -> Metadata {
    Metadata::from([("title".to_string(), vec![json!(value)])])
}

fn sets(ids: &[&str]) -> RecordSets {
    ids.iter()
        .map(|id| (id.to_string(), SetDescriptor::new(id.to_uppercase())))
        .collect()
}

/// Verify schema creation and empty queries work.
#[test]
fn test_schema_creation() {
    let db = StoreDb::open_memory().unwrap();
    assert!(db.has_schema().unwrap());
    assert_eq!(db.record_count().unwrap(), 0);
    assert_eq!(db.set_count().unwrap(), 0);
    assert_eq!(
        db.oai_earliest_datestamp().unwrap(),
        DateTime::<Utc>::UNIX_EPOCH
    );
}

/// Verify record staging, flush and lookup roundtrip.
#[test]
fn test_record_roundtrip() {
    let mut db = StoreDb::open_memory().unwrap();
    let mut metadata = title("Spam!");
    metadata.insert("year".into(), vec![json!(2010), json!(true)]);

    db.update_record("oai:spam", date(2010, 10, 13), false, &sets(&["food"]), &metadata)
        .unwrap();

    // Nothing is visible before the flush.
    assert!(db.has_pending());
    assert_eq!(db.get_record("oai:spam").unwrap(), None);
    assert_eq!(db.record_count().unwrap(), 0);

    let stats = db.flush().unwrap();
    assert_eq!((stats.records, stats.sets, stats.setrefs), (1, 1, 1));
    assert!(!db.has_pending());

    let record = db.get_record("oai:spam").unwrap().unwrap();
    assert_eq!(record.id, "oai:spam");
    assert_eq!(record.modified, date(2010, 10, 13));
    assert!(!record.deleted);
    assert_eq!(record.sets, vec!["food"]);
    assert_eq!(record.metadata, metadata);
    assert_eq!(db.get_record("bla").unwrap(), None);
}

/// Upserting the same record twice is the same as upserting it once.
#[test]
fn test_upsert_idempotence() {
    let mut once = StoreDb::open_memory().unwrap();
    let mut twice = StoreDb::open_memory().unwrap();
    let record_sets = sets(&["spam", "ham"]);

    once.update_record("oai:1", date(2009, 1, 1), false, &record_sets, &title("x"))
        .unwrap();
    once.flush().unwrap();
    for _ in 0..2 {
        twice
            .update_record("oai:1", date(2009, 1, 1), false, &record_sets, &title("x"))
            .unwrap();
    }
    twice.flush().unwrap();

    assert_eq!(once.record_count().unwrap(), twice.record_count().unwrap());
    assert_eq!(
        once.get_record("oai:1").unwrap(),
        twice.get_record("oai:1").unwrap()
    );

    // A second flush of an already stored id replaces it in place.
    twice
        .update_record("oai:1", date(2009, 1, 1), false, &record_sets, &title("x"))
        .unwrap();
    twice.flush().unwrap();
    assert_eq!(twice.record_count().unwrap(), 1);
}

/// Updating a record fully replaces its set membership.
#[test]
fn test_full_replace_semantics() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("oai:1", date(2009, 1, 1), false, &sets(&["a", "b"]), &title("old"))
        .unwrap();
    db.flush().unwrap();
    assert_eq!(db.get_setrefs("oai:1", true).unwrap(), vec!["a", "b"]);

    db.update_record("oai:1", date(2010, 1, 1), true, &sets(&["c"]), &Metadata::new())
        .unwrap();
    db.flush().unwrap();

    assert_eq!(db.get_setrefs("oai:1", true).unwrap(), vec!["c"]);
    let record = db.get_record("oai:1").unwrap().unwrap();
    assert!(record.deleted);
    assert!(record.metadata.is_empty());
    assert_eq!(record.modified, date(2010, 1, 1));

    // The sets themselves survive, only the reference is gone.
    assert!(db.get_set("a").unwrap().is_some());
    assert!(
        db.oai_query(&OaiQuery::new().needed_set("a"))
            .unwrap()
            .is_empty()
    );
}

/// Hidden sets filter but are never listed.
#[test]
fn test_hidden_set_invisibility() {
    let mut db = StoreDb::open_memory().unwrap();
    let hidden = RecordSets::from([(
        "secret".to_string(),
        SetDescriptor::new("Secret").hidden(),
    )]);
    db.update_record("oai:1", date(2009, 1, 1), false, &hidden, &title("x"))
        .unwrap();
    db.flush().unwrap();

    assert!(db.oai_sets(0, 100).unwrap().is_empty());
    assert!(db.get_record("oai:1").unwrap().unwrap().sets.is_empty());
    assert!(db.get_setrefs("oai:1", false).unwrap().is_empty());
    assert_eq!(db.get_setrefs("oai:1", true).unwrap(), vec!["secret"]);
    assert!(db.get_set("secret").unwrap().unwrap().hidden);

    let matched = db
        .oai_query(&OaiQuery::new().needed_set("secret"))
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert!(matched[0].sets.is_empty());
}

/// Removing a set drops references but keeps records.
#[test]
fn test_cascading_set_removal() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("oai:1", date(2009, 1, 1), false, &sets(&["s", "t"]), &title("1"))
        .unwrap();
    db.update_record("oai:2", date(2009, 1, 2), false, &sets(&["s"]), &title("2"))
        .unwrap();
    db.flush().unwrap();

    assert!(db.remove_set("s").unwrap());
    assert!(!db.remove_set("s").unwrap());

    assert_eq!(db.get_set("s").unwrap(), None);
    assert_eq!(db.get_setrefs("oai:1", true).unwrap(), vec!["t"]);
    assert!(db.get_setrefs("oai:2", true).unwrap().is_empty());
    assert!(db.get_record("oai:1").unwrap().is_some());
    assert!(db.get_record("oai:2").unwrap().is_some());
    assert_eq!(db.record_count().unwrap(), 2);
}

#[test]
fn test_remove_record() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("oai:1", date(2009, 1, 1), false, &sets(&["s"]), &title("1"))
        .unwrap();
    db.flush().unwrap();

    assert!(db.remove_record("oai:1").unwrap());
    assert_eq!(db.get_record("oai:1").unwrap(), None);
    assert!(db.get_setrefs("oai:1", true).unwrap().is_empty());
    // The set outlives its last member.
    assert!(db.get_set("s").unwrap().is_some());
    assert!(!db.remove_record("oai:1").unwrap());
}

/// Explicit set declarations and listing order.
#[test]
fn test_set_add_remove() {
    let mut db = StoreDb::open_memory().unwrap();
    for id in ["c", "a", "e", "b", "d"] {
        db.add_set(id, &format!("Set {id}"), None, false).unwrap();
    }
    db.add_set("hidden", "Hidden", None, true).unwrap();
    db.flush_update().unwrap();

    assert_eq!(db.set_count().unwrap(), 6);
    let listed: Vec<_> = db
        .oai_sets(0, 100)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(listed, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(db.oai_sets(2, 100).unwrap().len(), 3);
    assert_eq!(db.oai_sets(4, 100).unwrap().len(), 1);
    assert!(db.oai_sets(0, -1).unwrap().is_empty());

    db.add_set("added set", "An added set", Some("A set description"), false)
        .unwrap();
    db.flush().unwrap();
    let added = db.get_set("added set").unwrap().unwrap();
    assert_eq!(added.name, "An added set");
    assert_eq!(added.description.as_deref(), Some("A set description"));
    assert_eq!(db.oai_sets(0, 100).unwrap().len(), 6);

    db.remove_set("added set").unwrap();
    assert_eq!(db.oai_sets(0, 100).unwrap().len(), 5);
}

/// Re-declaring a set updates its descriptor without dropping members.
#[test]
fn test_set_redeclaration_keeps_members() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("oai:1", date(2009, 1, 1), false, &sets(&["s"]), &title("1"))
        .unwrap();
    db.flush().unwrap();

    db.add_set("s", "Renamed", Some("now hidden"), true).unwrap();
    db.flush().unwrap();

    let info = db.get_set("s").unwrap().unwrap();
    assert_eq!(info.name, "Renamed");
    assert!(info.hidden);
    assert_eq!(db.get_setrefs("oai:1", true).unwrap(), vec!["s"]);
}

#[test]
fn test_earliest_datestamp() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("a", date(2008, 1, 1), false, &RecordSets::new(), &title("a"))
        .unwrap();
    db.update_record("b", date(2004, 1, 1), true, &RecordSets::new(), &title("b"))
        .unwrap();
    db.flush().unwrap();
    assert_eq!(db.oai_earliest_datestamp().unwrap(), date(2004, 1, 1));
}

#[test]
fn test_earliest_datestamp_skips_future_records() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("future", date(2030, 1, 1), false, &RecordSets::new(), &title("f"))
        .unwrap();
    db.flush().unwrap();
    assert_eq!(
        db.oai_earliest_datestamp_at(date(2020, 1, 1)).unwrap(),
        DateTime::<Utc>::UNIX_EPOCH
    );

    db.update_record("past", date(2010, 1, 1), false, &RecordSets::new(), &title("p"))
        .unwrap();
    db.flush().unwrap();
    assert_eq!(
        db.oai_earliest_datestamp_at(date(2020, 1, 1)).unwrap(),
        date(2010, 1, 1)
    );
    assert_eq!(
        db.oai_earliest_datestamp_at(date(2040, 1, 1)).unwrap(),
        date(2010, 1, 1)
    );
}

#[test]
fn test_empty_database() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("a", date(2008, 1, 1), false, &sets(&["s"]), &title("a"))
        .unwrap();
    db.flush().unwrap();

    db.empty_database().unwrap();

    assert!(db.has_schema().unwrap());
    assert_eq!(db.record_count().unwrap(), 0);
    assert_eq!(db.set_count().unwrap(), 0);
    assert!(db.oai_sets(0, 20).unwrap().is_empty());
    assert!(db.oai_query(&OaiQuery::new()).unwrap().is_empty());
}

#[test]
fn test_empty_database_drops_staged_writes() {
    let mut db = StoreDb::open_memory().unwrap();
    db.add_set("s", "S", None, false).unwrap();
    db.update_record("a", date(2008, 1, 1), false, &sets(&["t"]), &title("a"))
        .unwrap();

    db.empty_database().unwrap();
    assert!(!db.has_pending());
    db.flush().unwrap();

    assert_eq!(db.set_count().unwrap(), 0);
    assert_eq!(db.record_count().unwrap(), 0);
}

#[test]
fn test_validation_errors() {
    let mut db = StoreDb::open_memory().unwrap();

    let err = db
        .update_record("", date(2008, 1, 1), false, &RecordSets::new(), &title("a"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));

    let bad_sets = RecordSets::from([(String::new(), SetDescriptor::new("nameless"))]);
    let err = db
        .update_record("a", date(2008, 1, 1), false, &bad_sets, &title("a"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));

    let nested = Metadata::from([("title".to_string(), vec![json!(["a", "b"])])]);
    let err = db
        .update_record("a", date(2008, 1, 1), false, &RecordSets::new(), &nested)
        .unwrap_err();
    assert!(matches!(err, Error::Validation { ref id, .. } if id == "a"));

    // Rejected input never reaches the write cache.
    assert!(!db.has_pending());
}

#[test]
fn test_discard_pending() {
    let mut db = StoreDb::open_memory().unwrap();
    db.update_record("a", date(2008, 1, 1), false, &sets(&["s", "t"]), &title("a"))
        .unwrap();
    assert_eq!(db.pending().record_len(), 1);
    assert_eq!(db.pending().set_len(), 2);

    db.discard_pending();
    assert!(!db.has_pending());
    assert_eq!(db.flush().unwrap().records, 0);
    assert_eq!(db.record_count().unwrap(), 0);
    assert_eq!(db.set_count().unwrap(), 0);
}

/// Readers on another connection see either nothing or the whole flush.
#[test_log::test]
fn test_flush_visibility_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.sqlite");

    let mut writer = StoreDb::open(&path, OpenMode::Create).unwrap();
    let reader = StoreDb::open(&path, OpenMode::ReadOnly).unwrap();

    for n in 0..10 {
        writer
            .update_record(
                &format!("oai:{n}"),
                date(2009, 1, 1 + n),
                false,
                &sets(&["batch"]),
                &title("x"),
            )
            .unwrap();
    }
    assert_eq!(reader.record_count().unwrap(), 0);

    writer.flush().unwrap();
    assert_eq!(reader.record_count().unwrap(), 10);
    assert_eq!(
        reader
            .oai_query(&OaiQuery::new().needed_set("batch").batch_size(100))
            .unwrap()
            .len(),
        10
    );
}

/// Flushed state survives reopening the database.
#[test]
fn test_durability_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.sqlite");

    {
        let mut db = StoreDb::open(&path, OpenMode::Create).unwrap();
        db.update_record("oai:spam", date(2010, 10, 13), false, &sets(&["s"]), &title("Spam!"))
            .unwrap();
        db.flush().unwrap();
        // Staged but never flushed: dropped with the connection.
        db.update_record("oai:ham", date(2009, 10, 13), false, &sets(&["s"]), &title("Ham"))
            .unwrap();
    }

    let db = StoreDb::open(&path, OpenMode::ReadWrite).unwrap();
    assert_eq!(db.record_count().unwrap(), 1);
    assert!(db.get_record("oai:spam").unwrap().is_some());
    assert_eq!(db.get_record("oai:ham").unwrap(), None);
}

#[test]
fn test_open_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.sqlite");
    assert!(matches!(
        StoreDb::open(&path, OpenMode::ReadOnly),
        Err(Error::DatabaseNotFound(_))
    ));
    assert!(matches!(
        StoreDb::open(&path, OpenMode::ReadWrite),
        Err(Error::DatabaseNotFound(_))
    ));
}

#[test]
fn test_schema_version_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.sqlite");
    StoreDb::open(&path, OpenMode::Create).unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
        .unwrap();

    match StoreDb::open(&path, OpenMode::ReadWrite) {
        Err(Error::SchemaVersionMismatch { expected, found }) => {
            assert_eq!(expected, SCHEMA_VERSION);
            assert_eq!(found, SCHEMA_VERSION + 1);
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("opened a database with a foreign schema version"),
    }
}
