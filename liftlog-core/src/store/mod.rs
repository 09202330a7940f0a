pub mod fallback;
pub mod memory;
pub mod sqlite;

pub use fallback::{FallbackStore, StoreMode};
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::db::models::{
    Exercise, ExerciseInput, ExercisePatch, ExerciseType, ExerciseTypePatch, Goal, GoalPatch,
    NewExercise, NewExerciseType, NewGoal, NewRoutineExercise, NewWorkout, NewWorkoutRoutine,
    RoutineExercise, RoutineExerciseInput, RoutineExercisePatch, Workout, WorkoutPatch,
    WorkoutRoutine, WorkoutRoutinePatch,
};
use crate::error::Result;
use async_trait::async_trait;

/// Keyed storage for every domain entity, implemented by the SQLite-backed
/// store and the in-memory store, and composed by [`FallbackStore`].
///
/// Ids are assigned at creation time, strictly increasing per entity type
/// and never reused after deletion. Point lookups return `Ok(None)` for a
/// missing id; updates merge the patch shallowly over the existing row;
/// deletes report whether anything was removed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Exercise types

    async fn create_exercise_type(&self, input: &NewExerciseType) -> Result<ExerciseType>;

    async fn get_exercise_type(&self, id: i64) -> Result<Option<ExerciseType>>;

    async fn get_exercise_type_by_name(&self, name: &str) -> Result<Option<ExerciseType>>;

    async fn get_all_exercise_types(&self) -> Result<Vec<ExerciseType>>;

    /// A name change rewrites every exercise and goal still referencing the
    /// old name (exact match). Exercises and goals carry the type name as a
    /// plain string, so this fix-up is what keeps history grouping intact
    /// across a rename.
    async fn update_exercise_type(
        &self,
        id: i64,
        patch: &ExerciseTypePatch,
    ) -> Result<Option<ExerciseType>>;

    async fn delete_exercise_type(&self, id: i64) -> Result<bool>;

    // Workouts

    async fn create_workout(&self, input: &NewWorkout) -> Result<Workout>;

    /// Creates a workout and its exercises as one unit: a single
    /// transaction in the durable store, a single locked call in the
    /// in-memory store. No caller can observe the workout without its
    /// exercises.
    async fn create_workout_with_exercises(
        &self,
        input: &NewWorkout,
        exercises: &[ExerciseInput],
    ) -> Result<(Workout, Vec<Exercise>)>;

    async fn get_workout(&self, id: i64) -> Result<Option<Workout>>;

    /// Ordered by date, newest first.
    async fn get_all_workouts(&self) -> Result<Vec<Workout>>;

    async fn update_workout(&self, id: i64, patch: &WorkoutPatch) -> Result<Option<Workout>>;

    /// Also deletes every exercise belonging to the workout.
    async fn delete_workout(&self, id: i64) -> Result<bool>;

    // Exercises

    async fn create_exercise(&self, input: &NewExercise) -> Result<Exercise>;

    async fn get_exercise(&self, id: i64) -> Result<Option<Exercise>>;

    async fn get_exercises_for_workout(&self, workout_id: i64) -> Result<Vec<Exercise>>;

    /// Exact, case-sensitive name match. This is the query the progress
    /// aggregator is built on.
    async fn get_exercises_by_name(&self, name: &str) -> Result<Vec<Exercise>>;

    async fn update_exercise(&self, id: i64, patch: &ExercisePatch) -> Result<Option<Exercise>>;

    async fn delete_exercise(&self, id: i64) -> Result<bool>;

    // Goals

    async fn create_goal(&self, input: &NewGoal) -> Result<Goal>;

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>>;

    async fn get_all_goals(&self) -> Result<Vec<Goal>>;

    async fn update_goal(&self, id: i64, patch: &GoalPatch) -> Result<Option<Goal>>;

    async fn delete_goal(&self, id: i64) -> Result<bool>;

    // Workout routines

    async fn create_workout_routine(&self, input: &NewWorkoutRoutine) -> Result<WorkoutRoutine>;

    /// Routine analogue of [`create_workout_with_exercises`]: routine and
    /// template entries land together or not at all.
    ///
    /// [`create_workout_with_exercises`]: RecordStore::create_workout_with_exercises
    async fn create_routine_with_exercises(
        &self,
        input: &NewWorkoutRoutine,
        exercises: &[RoutineExerciseInput],
    ) -> Result<(WorkoutRoutine, Vec<RoutineExercise>)>;

    async fn get_workout_routine(&self, id: i64) -> Result<Option<WorkoutRoutine>>;

    async fn get_all_workout_routines(&self) -> Result<Vec<WorkoutRoutine>>;

    async fn update_workout_routine(
        &self,
        id: i64,
        patch: &WorkoutRoutinePatch,
    ) -> Result<Option<WorkoutRoutine>>;

    /// Also deletes the routine's template entries.
    async fn delete_workout_routine(&self, id: i64) -> Result<bool>;

    // Routine exercises

    async fn create_routine_exercise(&self, input: &NewRoutineExercise) -> Result<RoutineExercise>;

    async fn get_routine_exercise(&self, id: i64) -> Result<Option<RoutineExercise>>;

    /// Entries for one routine, ordered by `order_index` ascending.
    async fn get_routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>>;

    async fn update_routine_exercise(
        &self,
        id: i64,
        patch: &RoutineExercisePatch,
    ) -> Result<Option<RoutineExercise>>;

    async fn delete_routine_exercise(&self, id: i64) -> Result<bool>;
}
