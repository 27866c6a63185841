use std::sync::Arc;

use chrono::Utc;
use leitner_study::session_store::{COLLECTIONS_KEY, HISTORY_KEY, SNAPSHOT_KEY};
use leitner_study::{
    Collection, Flashcard, KeyValueStore, LeitnerBoxes, SavedSessionState, SessionController,
    SessionEvent, SessionStore, SqliteStore, Stage, StudySessionRecord,
};

async fn sqlite_store() -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::new("sqlite::memory:")
            .await
            .expect("in-memory sqlite store"),
    )
}

fn sample_collections() -> Vec<Collection> {
    vec![
        Collection {
            id: "col-1".to_string(),
            name: "Photosynthesis".to_string(),
            cards: vec![
                Flashcard {
                    id: "card-1".to_string(),
                    question: "Where does photosynthesis happen?".to_string(),
                    answer: "In the chloroplasts".to_string(),
                },
                Flashcard {
                    id: "card-2".to_string(),
                    question: "Which gas is released?".to_string(),
                    answer: "Oxygen".to_string(),
                },
            ],
        },
        Collection {
            id: "col-2".to_string(),
            name: "Fractions".to_string(),
            cards: vec![Flashcard {
                id: "card-3".to_string(),
                question: "What is 1/2 + 1/4?".to_string(),
                answer: "3/4".to_string(),
            }],
        },
    ]
}

fn sample_history() -> Vec<StudySessionRecord> {
    vec![StudySessionRecord {
        id: "rec-1".to_string(),
        date: Utc::now(),
        collection_name: "Photosynthesis".to_string(),
        know_count: 1,
        regular_count: 1,
        dont_know_count: 0,
        total_time_seconds: 95,
        score: 8,
    }]
}

fn sample_snapshot() -> SavedSessionState {
    let collection = &sample_collections()[0];
    let mut boxes = LeitnerBoxes::with_unseen(collection.cards.clone());
    let graded = boxes.unseen.remove(0);
    boxes.dont_know.push(graded);

    SavedSessionState {
        stage: Stage::Studying,
        leitner_boxes: boxes,
        summary: "Plants turn light into sugar".to_string(),
        original_text: "Chapter 4".to_string(),
        seconds_left: 241,
        initial_minutes: 5,
        current_collection_id: Some("col-1".to_string()),
    }
}

#[tokio::test]
async fn test_sqlite_round_trip_of_all_slots() {
    let kv = sqlite_store().await;
    let store = SessionStore::new(kv.clone());

    store.save_collections(&sample_collections()).await.unwrap();
    store.save_history(&sample_history()).await.unwrap();
    store.save_snapshot(&sample_snapshot()).await.unwrap();

    let loaded = store.load_all().await;
    assert_eq!(loaded.collections, sample_collections());
    assert_eq!(loaded.history.len(), 1);
    assert_eq!(loaded.history[0].score, 8);
    assert_eq!(loaded.snapshot, Some(sample_snapshot()));
}

#[tokio::test]
async fn test_reload_without_changes_is_byte_identical() {
    let kv = sqlite_store().await;
    let store = SessionStore::new(kv.clone());

    store.save_collections(&sample_collections()).await.unwrap();
    store.save_history(&sample_history()).await.unwrap();
    store.save_snapshot(&sample_snapshot()).await.unwrap();

    let before = (
        kv.get(COLLECTIONS_KEY).await.unwrap(),
        kv.get(HISTORY_KEY).await.unwrap(),
        kv.get(SNAPSHOT_KEY).await.unwrap(),
    );

    let loaded = store.load_all().await;
    store.save_collections(&loaded.collections).await.unwrap();
    store.save_history(&loaded.history).await.unwrap();
    store
        .save_snapshot(loaded.snapshot.as_ref().unwrap())
        .await
        .unwrap();

    let after = (
        kv.get(COLLECTIONS_KEY).await.unwrap(),
        kv.get(HISTORY_KEY).await.unwrap(),
        kv.get(SNAPSHOT_KEY).await.unwrap(),
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_wire_format_uses_camel_case_fields() {
    let kv = sqlite_store().await;
    let store = SessionStore::new(kv.clone());
    store.save_history(&sample_history()).await.unwrap();
    store.save_snapshot(&sample_snapshot()).await.unwrap();

    let history = kv.get(HISTORY_KEY).await.unwrap().unwrap();
    assert!(history.contains("\"collectionName\""));
    assert!(history.contains("\"dontKnowCount\""));
    assert!(history.contains("\"totalTimeSeconds\""));

    let snapshot = kv.get(SNAPSHOT_KEY).await.unwrap().unwrap();
    assert!(snapshot.contains("\"leitnerBoxes\""));
    assert!(snapshot.contains("\"secondsLeft\""));
    assert!(snapshot.contains("\"stage\":\"studying\""));
}

#[tokio::test]
async fn test_corrupt_slots_fall_back_independently() {
    let kv = sqlite_store().await;
    let store = SessionStore::new(kv.clone());

    store.save_history(&sample_history()).await.unwrap();
    kv.set(COLLECTIONS_KEY, "not json at all").await.unwrap();
    kv.set(SNAPSHOT_KEY, "{\"stage\":").await.unwrap();

    let loaded = store.load_all().await;
    assert!(loaded.collections.is_empty());
    assert_eq!(loaded.history.len(), 1);
    assert!(loaded.snapshot.is_none());

    assert_eq!(kv.get(COLLECTIONS_KEY).await.unwrap(), None);
    assert_eq!(kv.get(SNAPSHOT_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_controller_resumes_after_restart() {
    let kv = sqlite_store().await;
    let store = SessionStore::new(kv.clone());
    store.save_collections(&sample_collections()).await.unwrap();

    let mut first = SessionController::load(store.clone(), 5).await;
    first
        .dispatch(SessionEvent::StudyCollection {
            collection_id: "col-2".to_string(),
        })
        .await
        .unwrap();
    first.tick().await;
    drop(first);

    let mut second = SessionController::load(store.clone(), 5).await;
    assert!(second.session().can_resume());
    second.dispatch(SessionEvent::ResumeSession).await.unwrap();

    let session = second.session();
    assert_eq!(session.stage(), Stage::Studying);
    assert_eq!(session.current_collection_id(), Some("col-2"));
    assert_eq!(session.current_card().unwrap().id, "card-3");
    assert_eq!(session.timer().seconds_remaining(), 299);

    // The resumed session is still saved in case of another restart
    assert!(kv.get(SNAPSHOT_KEY).await.unwrap().is_some());
}
