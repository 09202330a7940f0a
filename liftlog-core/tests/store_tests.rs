//! Record store contract tests, run against both backends.

use chrono::NaiveDate;
use liftlog::db::models::{
    ExerciseInput, ExercisePatch, ExerciseTypePatch, GoalPatch, NewExercise, NewExerciseType,
    NewGoal, NewRoutineExercise, NewWorkout, NewWorkoutRoutine, RoutineExerciseInput, SetEntry,
    WorkoutPatch,
};
use liftlog::{MemoryRecordStore, RecordStore, SqliteRecordStore};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn workout_input(name: &str, day: &str) -> NewWorkout {
    NewWorkout {
        name: name.to_string(),
        date: date(day),
        duration_minutes: Some(60),
        notes: None,
    }
}

fn exercise_input(workout_id: i64, name: &str) -> NewExercise {
    NewExercise {
        workout_id,
        name: name.to_string(),
        sets: vec![SetEntry {
            weight: 100.0,
            reps: 5,
        }],
    }
}

fn type_input(name: &str) -> NewExerciseType {
    NewExerciseType {
        name: name.to_string(),
        description: None,
        notes: None,
        category: Some("barbell".to_string()),
    }
}

fn goal_input(name: &str, exercise_name: Option<&str>) -> NewGoal {
    NewGoal {
        name: name.to_string(),
        exercise_name: exercise_name.map(str::to_string),
        target_weight: Some(140.0),
        target_reps: Some(5),
        target_date: None,
        current_progress: None,
    }
}

async fn ids_are_monotonic_and_never_reused(store: &dyn RecordStore) {
    let first = store
        .create_workout(&workout_input("a", "2024-01-01"))
        .await
        .unwrap();
    let second = store
        .create_workout(&workout_input("b", "2024-01-02"))
        .await
        .unwrap();
    assert!(second.id > first.id);

    assert!(store.delete_workout(second.id).await.unwrap());
    let third = store
        .create_workout(&workout_input("c", "2024-01-03"))
        .await
        .unwrap();
    assert!(
        third.id > second.id,
        "id {} was reused after deleting {}",
        third.id,
        second.id
    );
}

async fn workout_delete_cascades_to_exercises(store: &dyn RecordStore) {
    let workout = store
        .create_workout(&workout_input("push day", "2024-02-01"))
        .await
        .unwrap();
    let kept = store
        .create_workout(&workout_input("pull day", "2024-02-02"))
        .await
        .unwrap();
    store
        .create_exercise(&exercise_input(workout.id, "Bench Press"))
        .await
        .unwrap();
    store
        .create_exercise(&exercise_input(workout.id, "Overhead Press"))
        .await
        .unwrap();
    let kept_exercise = store
        .create_exercise(&exercise_input(kept.id, "Barbell Row"))
        .await
        .unwrap();

    assert!(store.delete_workout(workout.id).await.unwrap());

    assert!(store.get_workout(workout.id).await.unwrap().is_none());
    assert!(
        store
            .get_exercises_for_workout(workout.id)
            .await
            .unwrap()
            .is_empty()
    );
    // the other workout's exercises are untouched
    assert_eq!(
        store.get_exercises_for_workout(kept.id).await.unwrap(),
        vec![kept_exercise]
    );
}

async fn empty_patch_changes_nothing(store: &dyn RecordStore) {
    let workout = store
        .create_workout(&NewWorkout {
            name: "leg day".to_string(),
            date: date("2024-03-01"),
            duration_minutes: Some(45),
            notes: Some("felt strong".to_string()),
        })
        .await
        .unwrap();

    let updated = store
        .update_workout(workout.id, &WorkoutPatch::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated, workout);
}

async fn workout_name_is_never_cleared(store: &dyn RecordStore) {
    let workout = store
        .create_workout(&workout_input("leg day", "2024-03-01"))
        .await
        .unwrap();

    let updated = store
        .update_workout(
            workout.id,
            &WorkoutPatch {
                name: Some(String::new()),
                date: Some(date("2024-03-02")),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "leg day");
    assert_eq!(updated.date, date("2024-03-02"));
}

async fn patch_can_clear_nullable_fields(store: &dyn RecordStore) {
    let workout = store
        .create_workout(&NewWorkout {
            name: "tempo run".to_string(),
            date: date("2024-03-05"),
            duration_minutes: Some(30),
            notes: Some("easy pace".to_string()),
        })
        .await
        .unwrap();

    let updated = store
        .update_workout(
            workout.id,
            &WorkoutPatch {
                duration_minutes: Some(None),
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.duration_minutes, None);
    assert_eq!(updated.notes, None);
}

async fn rename_fixup_updates_exact_matches_only(store: &dyn RecordStore) {
    let bench = store
        .create_exercise_type(&type_input("Bench Press"))
        .await
        .unwrap();
    let workout = store
        .create_workout(&workout_input("push day", "2024-04-01"))
        .await
        .unwrap();
    let matching = store
        .create_exercise(&exercise_input(workout.id, "Bench Press"))
        .await
        .unwrap();
    let incline = store
        .create_exercise(&exercise_input(workout.id, "Incline Bench Press"))
        .await
        .unwrap();
    let goal = store
        .create_goal(&goal_input("bench 140", Some("Bench Press")))
        .await
        .unwrap();
    let other_goal = store
        .create_goal(&goal_input("incline 100", Some("Incline Bench Press")))
        .await
        .unwrap();

    let renamed = store
        .update_exercise_type(
            bench.id,
            &ExerciseTypePatch {
                name: Some("Barbell Bench Press".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Barbell Bench Press");

    assert_eq!(
        store.get_exercise(matching.id).await.unwrap().unwrap().name,
        "Barbell Bench Press"
    );
    // substring matches stay untouched
    assert_eq!(
        store.get_exercise(incline.id).await.unwrap().unwrap().name,
        "Incline Bench Press"
    );
    assert_eq!(
        store.get_goal(goal.id).await.unwrap().unwrap().exercise_name,
        Some("Barbell Bench Press".to_string())
    );
    assert_eq!(
        store
            .get_goal(other_goal.id)
            .await
            .unwrap()
            .unwrap()
            .exercise_name,
        Some("Incline Bench Press".to_string())
    );
}

async fn creation_defaults_are_filled(store: &dyn RecordStore) {
    let goal = store
        .create_goal(&goal_input("squat 180", None))
        .await
        .unwrap();
    assert!(!goal.is_completed);

    let routine = store
        .create_workout_routine(&NewWorkoutRoutine {
            name: "5x5".to_string(),
            description: None,
            category: None,
        })
        .await
        .unwrap();
    let squat = store.create_exercise_type(&type_input("Squat")).await.unwrap();
    let entry = store
        .create_routine_exercise(&NewRoutineExercise {
            routine_id: routine.id,
            exercise_type_id: squat.id,
            order_index: 0,
            default_sets: None,
            default_reps: Some(5),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(entry.default_sets, 3);
}

async fn workouts_list_newest_first(store: &dyn RecordStore) {
    store
        .create_workout(&workout_input("old", "2024-01-01"))
        .await
        .unwrap();
    store
        .create_workout(&workout_input("newest", "2024-05-01"))
        .await
        .unwrap();
    store
        .create_workout(&workout_input("middle", "2024-03-01"))
        .await
        .unwrap();

    let names: Vec<String> = store
        .get_all_workouts()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["newest", "middle", "old"]);
}

async fn routine_entries_ordered_and_cascaded(store: &dyn RecordStore) {
    let squat = store.create_exercise_type(&type_input("Squat")).await.unwrap();
    let press = store.create_exercise_type(&type_input("Press")).await.unwrap();

    let (routine, entries) = store
        .create_routine_with_exercises(
            &NewWorkoutRoutine {
                name: "full body".to_string(),
                description: Some("A/B alternation".to_string()),
                category: None,
            },
            &[
                RoutineExerciseInput {
                    exercise_type_id: press.id,
                    order_index: 1,
                    default_sets: Some(5),
                    default_reps: Some(5),
                    notes: None,
                },
                RoutineExerciseInput {
                    exercise_type_id: squat.id,
                    order_index: 0,
                    default_sets: Some(3),
                    default_reps: Some(5),
                    notes: None,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);

    let listed = store.get_routine_exercises(routine.id).await.unwrap();
    let order: Vec<i64> = listed.iter().map(|e| e.order_index).collect();
    assert_eq!(order, vec![0, 1]);
    assert_eq!(listed[0].exercise_type_id, squat.id);

    assert!(store.delete_workout_routine(routine.id).await.unwrap());
    assert!(
        store
            .get_routine_exercises(routine.id)
            .await
            .unwrap()
            .is_empty()
    );
}

async fn combined_workout_create_lands_together(store: &dyn RecordStore) {
    let (workout, exercises) = store
        .create_workout_with_exercises(
            &workout_input("push day", "2024-06-01"),
            &[
                ExerciseInput {
                    name: "Bench Press".to_string(),
                    sets: vec![
                        SetEntry {
                            weight: 100.0,
                            reps: 5,
                        },
                        SetEntry {
                            weight: 90.0,
                            reps: 8,
                        },
                    ],
                },
                ExerciseInput {
                    name: "Dips".to_string(),
                    sets: vec![SetEntry {
                        weight: 20.0,
                        reps: 10,
                    }],
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(exercises.len(), 2);
    assert!(exercises.iter().all(|e| e.workout_id == workout.id));

    let stored = store.get_exercises_for_workout(workout.id).await.unwrap();
    assert_eq!(stored, exercises);
}

async fn missing_rows_are_not_errors(store: &dyn RecordStore) {
    assert!(store.get_workout(42).await.unwrap().is_none());
    assert!(
        store
            .update_workout(42, &WorkoutPatch::default())
            .await
            .unwrap()
            .is_none()
    );
    assert!(!store.delete_workout(42).await.unwrap());
    assert!(!store.delete_goal(42).await.unwrap());
    assert!(
        store
            .update_goal(42, &GoalPatch::default())
            .await
            .unwrap()
            .is_none()
    );
}

async fn exercise_update_replaces_sets_wholesale(store: &dyn RecordStore) {
    let workout = store
        .create_workout(&workout_input("pull day", "2024-07-01"))
        .await
        .unwrap();
    let exercise = store
        .create_exercise(&exercise_input(workout.id, "Barbell Row"))
        .await
        .unwrap();

    let new_sets = vec![
        SetEntry {
            weight: 80.0,
            reps: 8,
        },
        SetEntry {
            weight: 85.0,
            reps: 6,
        },
    ];
    let updated = store
        .update_exercise(
            exercise.id,
            &ExercisePatch {
                name: None,
                sets: Some(new_sets.clone()),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Barbell Row");
    assert_eq!(updated.sets, new_sets);
    assert_eq!(updated.workout_id, workout.id);
}

macro_rules! backend_tests {
    ($backend:ident, $make:expr, [$($test:ident),* $(,)?]) => {
        mod $backend {
            use super::*;

            $(
                #[tokio::test]
                async fn $test() {
                    let store = $make;
                    super::$test(&store).await;
                }
            )*
        }
    };
}

backend_tests!(
    sqlite,
    SqliteRecordStore::connect_in_memory().await.unwrap(),
    [
        ids_are_monotonic_and_never_reused,
        workout_delete_cascades_to_exercises,
        empty_patch_changes_nothing,
        workout_name_is_never_cleared,
        patch_can_clear_nullable_fields,
        rename_fixup_updates_exact_matches_only,
        creation_defaults_are_filled,
        workouts_list_newest_first,
        routine_entries_ordered_and_cascaded,
        combined_workout_create_lands_together,
        missing_rows_are_not_errors,
        exercise_update_replaces_sets_wholesale,
    ]
);

backend_tests!(
    memory,
    MemoryRecordStore::new(),
    [
        ids_are_monotonic_and_never_reused,
        workout_delete_cascades_to_exercises,
        empty_patch_changes_nothing,
        workout_name_is_never_cleared,
        patch_can_clear_nullable_fields,
        rename_fixup_updates_exact_matches_only,
        creation_defaults_are_filled,
        workouts_list_newest_first,
        routine_entries_ordered_and_cascaded,
        combined_workout_create_lands_together,
        missing_rows_are_not_errors,
        exercise_update_replaces_sets_wholesale,
    ]
);
