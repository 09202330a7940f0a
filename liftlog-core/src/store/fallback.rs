//! Durable-first storage with a one-way in-memory fallback.
//!
//! [`FallbackStore`] serves every operation from the SQLite store until one
//! of them fails. The first failure is logged, the adapter flips to the
//! in-memory store, and it stays there for the rest of the process; the
//! durable store is never retried. This is a permanent degradation, not a
//! circuit breaker.
//!
//! Known limitation: the two backing stores have independent data and
//! independent id sequences, so the transition is a data-visibility
//! discontinuity. Rows written to the durable store before the failure are
//! invisible to reads served from memory afterwards, and ids restart from
//! the memory store's own sequence.

use async_trait::async_trait;
use log::warn;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::db::models::{
    Exercise, ExerciseInput, ExercisePatch, ExerciseType, ExerciseTypePatch, Goal, GoalPatch,
    NewExercise, NewExerciseType, NewGoal, NewRoutineExercise, NewWorkout, NewWorkoutRoutine,
    RoutineExercise, RoutineExerciseInput, RoutineExercisePatch, Workout, WorkoutPatch,
    WorkoutRoutine, WorkoutRoutinePatch,
};
use crate::error::{Result, StoreError};
use crate::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};

/// Current operating state of a [`FallbackStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Durable,
    Fallback,
}

pub struct FallbackStore {
    // None only when the durable store never came up; degraded is set in
    // that case.
    durable: Option<SqliteRecordStore>,
    memory: MemoryRecordStore,
    degraded: AtomicBool,
}

impl FallbackStore {
    pub fn new(durable: SqliteRecordStore) -> Self {
        Self {
            durable: Some(durable),
            memory: MemoryRecordStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Opens the durable store at `path`; when that fails the adapter
    /// starts out degraded instead of returning the error.
    pub async fn connect(path: impl AsRef<Path>) -> Self {
        match SqliteRecordStore::connect(path).await {
            Ok(durable) => Self::new(durable),
            Err(err) => {
                warn!("durable store unavailable at startup: {err}; starting in-memory");
                Self {
                    durable: None,
                    memory: MemoryRecordStore::new(),
                    degraded: AtomicBool::new(true),
                }
            }
        }
    }

    pub fn mode(&self) -> StoreMode {
        if self.degraded.load(Ordering::SeqCst) {
            StoreMode::Fallback
        } else {
            StoreMode::Durable
        }
    }

    fn mark_degraded(&self, operation: &str, err: &StoreError) {
        warn!(
            "durable store failed during {operation}: {err}; \
             falling back to in-memory storage for the rest of the process"
        );
        self.degraded.store(true, Ordering::SeqCst);
    }
}

// Runs the operation against the durable store while the adapter is in
// durable mode; the first error flips the mode and the same operation is
// retried against the memory store. All arguments are borrows, so the retry
// reuses them as-is.
macro_rules! with_fallback {
    ($self:ident . $op:ident ( $($arg:expr),* )) => {{
        if $self.mode() == StoreMode::Durable {
            if let Some(durable) = $self.durable.as_ref() {
                match durable.$op($($arg),*).await {
                    Ok(value) => return Ok(value),
                    Err(err) => $self.mark_degraded(stringify!($op), &err),
                }
            }
        }
        $self.memory.$op($($arg),*).await
    }};
}

#[async_trait]
impl RecordStore for FallbackStore {
    async fn create_exercise_type(&self, input: &NewExerciseType) -> Result<ExerciseType> {
        with_fallback!(self.create_exercise_type(input))
    }

    async fn get_exercise_type(&self, id: i64) -> Result<Option<ExerciseType>> {
        with_fallback!(self.get_exercise_type(id))
    }

    async fn get_exercise_type_by_name(&self, name: &str) -> Result<Option<ExerciseType>> {
        with_fallback!(self.get_exercise_type_by_name(name))
    }

    async fn get_all_exercise_types(&self) -> Result<Vec<ExerciseType>> {
        with_fallback!(self.get_all_exercise_types())
    }

    async fn update_exercise_type(
        &self,
        id: i64,
        patch: &ExerciseTypePatch,
    ) -> Result<Option<ExerciseType>> {
        with_fallback!(self.update_exercise_type(id, patch))
    }

    async fn delete_exercise_type(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_exercise_type(id))
    }

    async fn create_workout(&self, input: &NewWorkout) -> Result<Workout> {
        with_fallback!(self.create_workout(input))
    }

    async fn create_workout_with_exercises(
        &self,
        input: &NewWorkout,
        exercises: &[ExerciseInput],
    ) -> Result<(Workout, Vec<Exercise>)> {
        with_fallback!(self.create_workout_with_exercises(input, exercises))
    }

    async fn get_workout(&self, id: i64) -> Result<Option<Workout>> {
        with_fallback!(self.get_workout(id))
    }

    async fn get_all_workouts(&self) -> Result<Vec<Workout>> {
        with_fallback!(self.get_all_workouts())
    }

    async fn update_workout(&self, id: i64, patch: &WorkoutPatch) -> Result<Option<Workout>> {
        with_fallback!(self.update_workout(id, patch))
    }

    async fn delete_workout(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_workout(id))
    }

    async fn create_exercise(&self, input: &NewExercise) -> Result<Exercise> {
        with_fallback!(self.create_exercise(input))
    }

    async fn get_exercise(&self, id: i64) -> Result<Option<Exercise>> {
        with_fallback!(self.get_exercise(id))
    }

    async fn get_exercises_for_workout(&self, workout_id: i64) -> Result<Vec<Exercise>> {
        with_fallback!(self.get_exercises_for_workout(workout_id))
    }

    async fn get_exercises_by_name(&self, name: &str) -> Result<Vec<Exercise>> {
        with_fallback!(self.get_exercises_by_name(name))
    }

    async fn update_exercise(&self, id: i64, patch: &ExercisePatch) -> Result<Option<Exercise>> {
        with_fallback!(self.update_exercise(id, patch))
    }

    async fn delete_exercise(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_exercise(id))
    }

    async fn create_goal(&self, input: &NewGoal) -> Result<Goal> {
        with_fallback!(self.create_goal(input))
    }

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        with_fallback!(self.get_goal(id))
    }

    async fn get_all_goals(&self) -> Result<Vec<Goal>> {
        with_fallback!(self.get_all_goals())
    }

    async fn update_goal(&self, id: i64, patch: &GoalPatch) -> Result<Option<Goal>> {
        with_fallback!(self.update_goal(id, patch))
    }

    async fn delete_goal(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_goal(id))
    }

    async fn create_workout_routine(&self, input: &NewWorkoutRoutine) -> Result<WorkoutRoutine> {
        with_fallback!(self.create_workout_routine(input))
    }

    async fn create_routine_with_exercises(
        &self,
        input: &NewWorkoutRoutine,
        exercises: &[RoutineExerciseInput],
    ) -> Result<(WorkoutRoutine, Vec<RoutineExercise>)> {
        with_fallback!(self.create_routine_with_exercises(input, exercises))
    }

    async fn get_workout_routine(&self, id: i64) -> Result<Option<WorkoutRoutine>> {
        with_fallback!(self.get_workout_routine(id))
    }

    async fn get_all_workout_routines(&self) -> Result<Vec<WorkoutRoutine>> {
        with_fallback!(self.get_all_workout_routines())
    }

    async fn update_workout_routine(
        &self,
        id: i64,
        patch: &WorkoutRoutinePatch,
    ) -> Result<Option<WorkoutRoutine>> {
        with_fallback!(self.update_workout_routine(id, patch))
    }

    async fn delete_workout_routine(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_workout_routine(id))
    }

    async fn create_routine_exercise(&self, input: &NewRoutineExercise) -> Result<RoutineExercise> {
        with_fallback!(self.create_routine_exercise(input))
    }

    async fn get_routine_exercise(&self, id: i64) -> Result<Option<RoutineExercise>> {
        with_fallback!(self.get_routine_exercise(id))
    }

    async fn get_routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        with_fallback!(self.get_routine_exercises(routine_id))
    }

    async fn update_routine_exercise(
        &self,
        id: i64,
        patch: &RoutineExercisePatch,
    ) -> Result<Option<RoutineExercise>> {
        with_fallback!(self.update_routine_exercise(id, patch))
    }

    async fn delete_routine_exercise(&self, id: i64) -> Result<bool> {
        with_fallback!(self.delete_routine_exercise(id))
    }
}
