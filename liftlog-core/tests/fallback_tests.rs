//! Fallback adapter behavior: one-way degradation and its documented
//! data-visibility discontinuity.

use chrono::NaiveDate;
use liftlog::db;
use liftlog::db::models::{NewGoal, NewWorkout};
use liftlog::{FallbackStore, RecordStore, SqliteRecordStore, StoreMode};

fn workout_input(name: &str) -> NewWorkout {
    NewWorkout {
        name: name.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        duration_minutes: None,
        notes: None,
    }
}

fn goal_input(name: &str) -> NewGoal {
    NewGoal {
        name: name.to_string(),
        exercise_name: None,
        target_weight: None,
        target_reps: None,
        target_date: None,
        current_progress: None,
    }
}

#[tokio::test]
async fn first_durable_failure_degrades_for_good() {
    let pool = db::connect_in_memory().await.unwrap();
    let store = FallbackStore::new(SqliteRecordStore::from_pool(pool.clone()));

    let before = store.create_workout(&workout_input("before")).await.unwrap();
    assert_eq!(store.mode(), StoreMode::Durable);

    // kill the durable backend out from under the adapter
    pool.close().await;

    // the failing operation is transparently retried against memory, which
    // knows nothing about the durable rows
    assert!(store.get_workout(before.id).await.unwrap().is_none());
    assert_eq!(store.mode(), StoreMode::Fallback);

    // every subsequent operation, across entity types, is served by memory
    let goal = store.create_goal(&goal_input("bench 140")).await.unwrap();
    assert_eq!(goal.id, 1);

    let after = store.create_workout(&workout_input("after")).await.unwrap();
    // independent id sequence: the memory store starts over
    assert_eq!(after.id, 1);

    let names: Vec<String> = store
        .get_all_workouts()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["after"]);
    assert_eq!(store.mode(), StoreMode::Fallback);
}

#[tokio::test]
async fn durable_store_is_never_written_again_after_degradation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("liftlog.db");

    let pool = db::connect(&path).await.unwrap();
    let store = FallbackStore::new(SqliteRecordStore::from_pool(pool.clone()));

    store.create_workout(&workout_input("before")).await.unwrap();
    pool.close().await;

    store.create_workout(&workout_input("after")).await.unwrap();
    assert_eq!(store.mode(), StoreMode::Fallback);
    store.create_workout(&workout_input("later")).await.unwrap();

    // reopen the file: only the pre-degradation row ever reached it
    let reopened = SqliteRecordStore::connect(&path).await.unwrap();
    let names: Vec<String> = reopened
        .get_all_workouts()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["before"]);
}

#[tokio::test]
async fn unreachable_database_at_startup_starts_degraded() {
    let dir = tempfile::tempdir().unwrap();
    // parent directory does not exist, so the sqlite open fails
    let path = dir.path().join("missing").join("sub").join("liftlog.db");

    let store = FallbackStore::connect(&path).await;
    assert_eq!(store.mode(), StoreMode::Fallback);

    let workout = store.create_workout(&workout_input("memory only")).await.unwrap();
    assert_eq!(workout.id, 1);
    assert_eq!(
        store.get_workout(workout.id).await.unwrap().unwrap().name,
        "memory only"
    );
}
