//! Exercise progress history derived from stored workouts.
//!
//! Each exercise row matching a name is joined to its owning workout's date
//! and reduced to its heaviest set, yielding one point per performed
//! exercise, sorted by date. Exercises whose workout has since been deleted
//! and exercises with no recorded sets are skipped; the `_report` variant
//! exposes how many of each were dropped.

use chrono::NaiveDate;
use log::debug;

use crate::db::models::SetEntry;
use crate::error::Result;
use crate::store::RecordStore;

/// One point in an exercise's history: the heaviest set recorded on the
/// owning workout's date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: i64,
}

/// History plus counts of rows that were silently skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryReport {
    pub points: Vec<ProgressPoint>,
    pub skipped_orphans: usize,
    pub skipped_empty: usize,
}

/// The set with the maximum weight; on equal weights the first one in
/// stored order wins.
pub fn heaviest_set(sets: &[SetEntry]) -> Option<&SetEntry> {
    let mut best: Option<&SetEntry> = None;
    for set in sets {
        if best.is_none_or(|b| set.weight > b.weight) {
            best = Some(set);
        }
    }
    best
}

pub async fn exercise_history_report(
    store: &dyn RecordStore,
    name: &str,
) -> Result<HistoryReport> {
    let mut report = HistoryReport::default();

    for exercise in store.get_exercises_by_name(name).await? {
        let Some(workout) = store.get_workout(exercise.workout_id).await? else {
            debug!(
                "skipping exercise {}: workout {} no longer exists",
                exercise.id, exercise.workout_id
            );
            report.skipped_orphans += 1;
            continue;
        };
        let Some(set) = heaviest_set(&exercise.sets) else {
            debug!("skipping exercise {}: no recorded sets", exercise.id);
            report.skipped_empty += 1;
            continue;
        };
        report.points.push(ProgressPoint {
            date: workout.date,
            weight: set.weight,
            reps: set.reps,
        });
    }

    report.points.sort_by_key(|p| p.date);
    Ok(report)
}

/// Chronological weight/reps history for an exercise name (exact match).
/// No matching rows means an empty history, never placeholder data.
pub async fn exercise_history(store: &dyn RecordStore, name: &str) -> Result<Vec<ProgressPoint>> {
    Ok(exercise_history_report(store, name).await?.points)
}

/// The last `limit` entries of the history, still in ascending date order.
pub async fn exercise_sets(
    store: &dyn RecordStore,
    name: &str,
    limit: usize,
) -> Result<Vec<ProgressPoint>> {
    let mut points = exercise_history(store, name).await?;
    let start = points.len().saturating_sub(limit);
    Ok(points.split_off(start))
}

/// Weight and reps from the most recent history entry, or `None` when
/// nothing matches the name.
pub async fn latest_exercise_set(
    store: &dyn RecordStore,
    name: &str,
) -> Result<Option<SetEntry>> {
    Ok(exercise_history(store, name).await?.pop().map(|p| SetEntry {
        weight: p.weight,
        reps: p.reps,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewExercise, NewWorkout, SetEntry};
    use crate::store::MemoryRecordStore;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn set(weight: f64, reps: i64) -> SetEntry {
        SetEntry { weight, reps }
    }

    async fn add_workout(store: &MemoryRecordStore, day: &str, name: &str, sets: Vec<SetEntry>) {
        let workout = store
            .create_workout(&NewWorkout {
                name: format!("session {day}"),
                date: date(day),
                duration_minutes: None,
                notes: None,
            })
            .await
            .unwrap();
        store
            .create_exercise(&NewExercise {
                workout_id: workout.id,
                name: name.to_string(),
                sets,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn history_takes_heaviest_set_per_workout_in_date_order() {
        let store = MemoryRecordStore::new();
        // inserted out of date order on purpose
        add_workout(
            &store,
            "2024-01-08",
            "Bench Press",
            vec![set(110.0, 5), set(90.0, 8)],
        )
        .await;
        add_workout(&store, "2024-01-01", "Bench Press", vec![set(100.0, 5)]).await;

        let history = exercise_history(&store, "Bench Press").await.unwrap();
        assert_eq!(
            history,
            vec![
                ProgressPoint {
                    date: date("2024-01-01"),
                    weight: 100.0,
                    reps: 5
                },
                ProgressPoint {
                    date: date("2024-01-08"),
                    weight: 110.0,
                    reps: 5
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_exercise_yields_empty_history() {
        let store = MemoryRecordStore::new();
        add_workout(&store, "2024-01-01", "Squat", vec![set(140.0, 3)]).await;

        let history = exercise_history(&store, "Bench Press").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn name_match_is_exact_and_case_sensitive() {
        let store = MemoryRecordStore::new();
        add_workout(&store, "2024-01-01", "Bench Press", vec![set(100.0, 5)]).await;
        add_workout(
            &store,
            "2024-01-02",
            "Incline Bench Press",
            vec![set(80.0, 8)],
        )
        .await;

        let history = exercise_history(&store, "Bench Press").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].weight, 100.0);

        assert!(exercise_history(&store, "bench press").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn heaviest_set_tie_goes_to_first_occurrence() {
        let sets = vec![set(100.0, 5), set(100.0, 8), set(90.0, 10)];
        let best = heaviest_set(&sets).unwrap();
        assert_eq!(best.reps, 5);
    }

    #[tokio::test]
    async fn orphaned_and_empty_exercises_are_skipped_and_counted() {
        let store = MemoryRecordStore::new();
        add_workout(&store, "2024-01-01", "Deadlift", vec![set(180.0, 2)]).await;
        // workout 99 never existed; the memory store does not enforce the
        // reference
        store
            .create_exercise(&NewExercise {
                workout_id: 99,
                name: "Deadlift".to_string(),
                sets: vec![set(200.0, 1)],
            })
            .await
            .unwrap();
        add_workout(&store, "2024-01-05", "Deadlift", vec![]).await;

        let report = exercise_history_report(&store, "Deadlift").await.unwrap();
        assert_eq!(report.points.len(), 1);
        assert_eq!(report.skipped_orphans, 1);
        assert_eq!(report.skipped_empty, 1);
    }

    #[tokio::test]
    async fn exercise_sets_returns_most_recent_tail_in_ascending_order() {
        let store = MemoryRecordStore::new();
        add_workout(&store, "2024-01-01", "Squat", vec![set(100.0, 5)]).await;
        add_workout(&store, "2024-01-08", "Squat", vec![set(105.0, 5)]).await;
        add_workout(&store, "2024-01-15", "Squat", vec![set(110.0, 5)]).await;

        let tail = exercise_sets(&store, "Squat", 2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].date, date("2024-01-08"));
        assert_eq!(tail[1].date, date("2024-01-15"));

        let all = exercise_sets(&store, "Squat", 10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn latest_set_comes_from_most_recent_workout() {
        let store = MemoryRecordStore::new();
        add_workout(&store, "2024-01-01", "Row", vec![set(60.0, 10)]).await;
        add_workout(
            &store,
            "2024-01-08",
            "Row",
            vec![set(65.0, 8), set(70.0, 6)],
        )
        .await;

        let latest = latest_exercise_set(&store, "Row").await.unwrap().unwrap();
        assert_eq!(latest.weight, 70.0);
        assert_eq!(latest.reps, 6);

        assert!(latest_exercise_set(&store, "Curl").await.unwrap().is_none());
    }
}
