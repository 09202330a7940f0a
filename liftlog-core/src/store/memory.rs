use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::db::models::{
    Exercise, ExerciseInput, ExercisePatch, ExerciseType, ExerciseTypePatch, Goal, GoalPatch,
    NewExercise, NewExerciseType, NewGoal, NewRoutineExercise, NewWorkout, NewWorkoutRoutine,
    RoutineExercise, RoutineExerciseInput, RoutineExercisePatch, SetEntry, Workout, WorkoutPatch,
    WorkoutRoutine, WorkoutRoutinePatch,
};
use crate::error::Result;
use crate::store::RecordStore;

/// Per-entity id sequences. Counters only move forward, so ids are strictly
/// increasing and never handed out twice, matching the durable store.
#[derive(Debug, Default)]
struct Sequences {
    exercise_types: i64,
    workouts: i64,
    exercises: i64,
    goals: i64,
    routines: i64,
    routine_exercises: i64,
}

#[derive(Debug, Default)]
struct Tables {
    sequences: Sequences,
    exercise_types: BTreeMap<i64, ExerciseType>,
    workouts: BTreeMap<i64, Workout>,
    exercises: BTreeMap<i64, Exercise>,
    goals: BTreeMap<i64, Goal>,
    routines: BTreeMap<i64, WorkoutRoutine>,
    routine_exercises: BTreeMap<i64, RoutineExercise>,
}

/// Record store held entirely in process memory.
///
/// Every operation takes the single table lock once and finishes inside it,
/// so multi-step operations (cascading deletes, combined creates, the
/// rename fix-up) are atomic from any other caller's point of view.
/// Concurrent writers race with last-write-wins semantics; there is no
/// version check.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_exercise_type(&self, input: &NewExerciseType) -> Result<ExerciseType> {
        let mut tables = self.inner.lock().await;
        tables.sequences.exercise_types += 1;
        let entity = ExerciseType {
            id: tables.sequences.exercise_types,
            name: input.name.clone(),
            description: input.description.clone(),
            notes: input.notes.clone(),
            category: input.category.clone(),
            created_at: now_epoch(),
        };
        tables.exercise_types.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_exercise_type(&self, id: i64) -> Result<Option<ExerciseType>> {
        Ok(self.inner.lock().await.exercise_types.get(&id).cloned())
    }

    async fn get_exercise_type_by_name(&self, name: &str) -> Result<Option<ExerciseType>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .exercise_types
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn get_all_exercise_types(&self) -> Result<Vec<ExerciseType>> {
        Ok(self
            .inner
            .lock()
            .await
            .exercise_types
            .values()
            .cloned()
            .collect())
    }

    async fn update_exercise_type(
        &self,
        id: i64,
        patch: &ExerciseTypePatch,
    ) -> Result<Option<ExerciseType>> {
        let mut tables = self.inner.lock().await;
        let Some(mut entity) = tables.exercise_types.get(&id).cloned() else {
            return Ok(None);
        };

        let renamed_from = patch.apply(&mut entity);
        let new_name = entity.name.clone();
        tables.exercise_types.insert(id, entity.clone());

        if let Some(old_name) = renamed_from {
            let mut exercises = 0usize;
            for exercise in tables.exercises.values_mut() {
                if exercise.name == old_name {
                    exercise.name = new_name.clone();
                    exercises += 1;
                }
            }
            let mut goals = 0usize;
            for goal in tables.goals.values_mut() {
                if goal.exercise_name.as_deref() == Some(old_name.as_str()) {
                    goal.exercise_name = Some(new_name.clone());
                    goals += 1;
                }
            }
            info!(
                "renamed exercise type {} \"{}\" -> \"{}\": {} exercises, {} goals updated",
                id, old_name, new_name, exercises, goals
            );
        }

        Ok(Some(entity))
    }

    async fn delete_exercise_type(&self, id: i64) -> Result<bool> {
        Ok(self.inner.lock().await.exercise_types.remove(&id).is_some())
    }

    async fn create_workout(&self, input: &NewWorkout) -> Result<Workout> {
        let mut tables = self.inner.lock().await;
        Ok(insert_workout(&mut tables, input))
    }

    async fn create_workout_with_exercises(
        &self,
        input: &NewWorkout,
        exercises: &[ExerciseInput],
    ) -> Result<(Workout, Vec<Exercise>)> {
        let mut tables = self.inner.lock().await;
        let workout = insert_workout(&mut tables, input);
        let created = exercises
            .iter()
            .map(|exercise| {
                insert_exercise(
                    &mut tables,
                    workout.id,
                    exercise.name.clone(),
                    exercise.sets.clone(),
                )
            })
            .collect();
        Ok((workout, created))
    }

    async fn get_workout(&self, id: i64) -> Result<Option<Workout>> {
        Ok(self.inner.lock().await.workouts.get(&id).cloned())
    }

    async fn get_all_workouts(&self) -> Result<Vec<Workout>> {
        let tables = self.inner.lock().await;
        let mut workouts: Vec<Workout> = tables.workouts.values().cloned().collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(workouts)
    }

    async fn update_workout(&self, id: i64, patch: &WorkoutPatch) -> Result<Option<Workout>> {
        let mut tables = self.inner.lock().await;
        let Some(entity) = tables.workouts.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_workout(&self, id: i64) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        let removed = tables.workouts.remove(&id).is_some();
        if removed {
            tables.exercises.retain(|_, e| e.workout_id != id);
        }
        Ok(removed)
    }

    async fn create_exercise(&self, input: &NewExercise) -> Result<Exercise> {
        let mut tables = self.inner.lock().await;
        Ok(insert_exercise(
            &mut tables,
            input.workout_id,
            input.name.clone(),
            input.sets.clone(),
        ))
    }

    async fn get_exercise(&self, id: i64) -> Result<Option<Exercise>> {
        Ok(self.inner.lock().await.exercises.get(&id).cloned())
    }

    async fn get_exercises_for_workout(&self, workout_id: i64) -> Result<Vec<Exercise>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .exercises
            .values()
            .filter(|e| e.workout_id == workout_id)
            .cloned()
            .collect())
    }

    async fn get_exercises_by_name(&self, name: &str) -> Result<Vec<Exercise>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .exercises
            .values()
            .filter(|e| e.name == name)
            .cloned()
            .collect())
    }

    async fn update_exercise(&self, id: i64, patch: &ExercisePatch) -> Result<Option<Exercise>> {
        let mut tables = self.inner.lock().await;
        let Some(entity) = tables.exercises.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_exercise(&self, id: i64) -> Result<bool> {
        Ok(self.inner.lock().await.exercises.remove(&id).is_some())
    }

    async fn create_goal(&self, input: &NewGoal) -> Result<Goal> {
        let mut tables = self.inner.lock().await;
        tables.sequences.goals += 1;
        let entity = Goal {
            id: tables.sequences.goals,
            name: input.name.clone(),
            exercise_name: input.exercise_name.clone(),
            target_weight: input.target_weight,
            target_reps: input.target_reps,
            target_date: input.target_date,
            is_completed: false,
            current_progress: input.current_progress,
        };
        tables.goals.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        Ok(self.inner.lock().await.goals.get(&id).cloned())
    }

    async fn get_all_goals(&self) -> Result<Vec<Goal>> {
        Ok(self.inner.lock().await.goals.values().cloned().collect())
    }

    async fn update_goal(&self, id: i64, patch: &GoalPatch) -> Result<Option<Goal>> {
        let mut tables = self.inner.lock().await;
        let Some(entity) = tables.goals.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_goal(&self, id: i64) -> Result<bool> {
        Ok(self.inner.lock().await.goals.remove(&id).is_some())
    }

    async fn create_workout_routine(&self, input: &NewWorkoutRoutine) -> Result<WorkoutRoutine> {
        let mut tables = self.inner.lock().await;
        Ok(insert_routine(&mut tables, input))
    }

    async fn create_routine_with_exercises(
        &self,
        input: &NewWorkoutRoutine,
        exercises: &[RoutineExerciseInput],
    ) -> Result<(WorkoutRoutine, Vec<RoutineExercise>)> {
        let mut tables = self.inner.lock().await;
        let routine = insert_routine(&mut tables, input);
        let created = exercises
            .iter()
            .map(|exercise| {
                insert_routine_exercise(
                    &mut tables,
                    &NewRoutineExercise {
                        routine_id: routine.id,
                        exercise_type_id: exercise.exercise_type_id,
                        order_index: exercise.order_index,
                        default_sets: exercise.default_sets,
                        default_reps: exercise.default_reps,
                        notes: exercise.notes.clone(),
                    },
                )
            })
            .collect();
        Ok((routine, created))
    }

    async fn get_workout_routine(&self, id: i64) -> Result<Option<WorkoutRoutine>> {
        Ok(self.inner.lock().await.routines.get(&id).cloned())
    }

    async fn get_all_workout_routines(&self) -> Result<Vec<WorkoutRoutine>> {
        Ok(self.inner.lock().await.routines.values().cloned().collect())
    }

    async fn update_workout_routine(
        &self,
        id: i64,
        patch: &WorkoutRoutinePatch,
    ) -> Result<Option<WorkoutRoutine>> {
        let mut tables = self.inner.lock().await;
        let Some(entity) = tables.routines.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_workout_routine(&self, id: i64) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        let removed = tables.routines.remove(&id).is_some();
        if removed {
            tables.routine_exercises.retain(|_, e| e.routine_id != id);
        }
        Ok(removed)
    }

    async fn create_routine_exercise(&self, input: &NewRoutineExercise) -> Result<RoutineExercise> {
        let mut tables = self.inner.lock().await;
        Ok(insert_routine_exercise(&mut tables, input))
    }

    async fn get_routine_exercise(&self, id: i64) -> Result<Option<RoutineExercise>> {
        Ok(self.inner.lock().await.routine_exercises.get(&id).cloned())
    }

    async fn get_routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        let tables = self.inner.lock().await;
        let mut entries: Vec<RoutineExercise> = tables
            .routine_exercises
            .values()
            .filter(|e| e.routine_id == routine_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.order_index);
        Ok(entries)
    }

    async fn update_routine_exercise(
        &self,
        id: i64,
        patch: &RoutineExercisePatch,
    ) -> Result<Option<RoutineExercise>> {
        let mut tables = self.inner.lock().await;
        let Some(entity) = tables.routine_exercises.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_routine_exercise(&self, id: i64) -> Result<bool> {
        Ok(self.inner.lock().await.routine_exercises.remove(&id).is_some())
    }
}

fn insert_workout(tables: &mut Tables, input: &NewWorkout) -> Workout {
    tables.sequences.workouts += 1;
    let entity = Workout {
        id: tables.sequences.workouts,
        name: input.name.clone(),
        date: input.date,
        duration_minutes: input.duration_minutes,
        notes: input.notes.clone(),
    };
    tables.workouts.insert(entity.id, entity.clone());
    entity
}

fn insert_exercise(tables: &mut Tables, workout_id: i64, name: String, sets: Vec<SetEntry>) -> Exercise {
    tables.sequences.exercises += 1;
    let entity = Exercise {
        id: tables.sequences.exercises,
        workout_id,
        name,
        sets,
    };
    tables.exercises.insert(entity.id, entity.clone());
    entity
}

fn insert_routine(tables: &mut Tables, input: &NewWorkoutRoutine) -> WorkoutRoutine {
    tables.sequences.routines += 1;
    let entity = WorkoutRoutine {
        id: tables.sequences.routines,
        name: input.name.clone(),
        description: input.description.clone(),
        category: input.category.clone(),
        created_at: now_epoch(),
    };
    tables.routines.insert(entity.id, entity.clone());
    entity
}

fn insert_routine_exercise(tables: &mut Tables, input: &NewRoutineExercise) -> RoutineExercise {
    tables.sequences.routine_exercises += 1;
    let entity = RoutineExercise {
        id: tables.sequences.routine_exercises,
        routine_id: input.routine_id,
        exercise_type_id: input.exercise_type_id,
        order_index: input.order_index,
        default_sets: input.default_sets.unwrap_or(3),
        default_reps: input.default_reps,
        notes: input.notes.clone(),
    };
    tables.routine_exercises.insert(entity.id, entity.clone());
    entity
}
