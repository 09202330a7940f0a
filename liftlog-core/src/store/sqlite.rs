use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::path::Path;

use crate::db;
use crate::db::models::{
    Exercise, ExerciseInput, ExercisePatch, ExerciseType, ExerciseTypePatch, Goal, GoalPatch,
    NewExercise, NewExerciseType, NewGoal, NewRoutineExercise, NewWorkout, NewWorkoutRoutine,
    RoutineExercise, RoutineExerciseInput, RoutineExercisePatch, Workout, WorkoutPatch,
    WorkoutRoutine, WorkoutRoutinePatch,
};
use crate::error::Result;
use crate::store::RecordStore;

/// Durable record store backed by SQLite.
///
/// The set list of an exercise is persisted as a JSON-encoded TEXT column;
/// encoding and decoding stay inside this module. Primary keys use
/// AUTOINCREMENT so ids keep increasing and are never reused, even after
/// deletes.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

/// Raw exercise row; `sets` holds the JSON payload before decoding.
#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: i64,
    workout_id: i64,
    name: String,
    sets: String,
}

impl ExerciseRow {
    fn into_exercise(self) -> Result<Exercise> {
        Ok(Exercise {
            id: self.id,
            workout_id: self.workout_id,
            name: self.name,
            sets: serde_json::from_str(&self.sets)?,
        })
    }
}

fn decode_exercises(rows: Vec<ExerciseRow>) -> Result<Vec<Exercise>> {
    rows.into_iter().map(ExerciseRow::into_exercise).collect()
}

impl SqliteRecordStore {
    /// Opens the database at `path`, creating it and running migrations as
    /// needed.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let pool = db::connect(path).await?;
        Ok(Self { pool })
    }

    /// A store over a private in-memory database, mainly for tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = db::connect_in_memory().await?;
        Ok(Self { pool })
    }

    /// Wraps an already-connected pool. Migrations are assumed to have run.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_exercise_type(&self, input: &NewExerciseType) -> Result<ExerciseType> {
        let created = sqlx::query_as::<_, ExerciseType>(
            "INSERT INTO exercise_types (name, description, notes, category)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.notes)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_exercise_type(&self, id: i64) -> Result<Option<ExerciseType>> {
        let found =
            sqlx::query_as::<_, ExerciseType>("SELECT * FROM exercise_types WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found)
    }

    async fn get_exercise_type_by_name(&self, name: &str) -> Result<Option<ExerciseType>> {
        let found =
            sqlx::query_as::<_, ExerciseType>("SELECT * FROM exercise_types WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found)
    }

    async fn get_all_exercise_types(&self) -> Result<Vec<ExerciseType>> {
        let types =
            sqlx::query_as::<_, ExerciseType>("SELECT * FROM exercise_types ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(types)
    }

    async fn update_exercise_type(
        &self,
        id: i64,
        patch: &ExerciseTypePatch,
    ) -> Result<Option<ExerciseType>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut entity) =
            sqlx::query_as::<_, ExerciseType>("SELECT * FROM exercise_types WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };

        let renamed_from = patch.apply(&mut entity);

        sqlx::query(
            "UPDATE exercise_types
             SET name = ?1, description = ?2, notes = ?3, category = ?4
             WHERE id = ?5",
        )
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(&entity.notes)
        .bind(&entity.category)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(old_name) = renamed_from {
            let exercises = sqlx::query("UPDATE exercises SET name = ?1 WHERE name = ?2")
                .bind(&entity.name)
                .bind(&old_name)
                .execute(&mut *tx)
                .await?;
            let goals =
                sqlx::query("UPDATE goals SET exercise_name = ?1 WHERE exercise_name = ?2")
                    .bind(&entity.name)
                    .bind(&old_name)
                    .execute(&mut *tx)
                    .await?;
            info!(
                "renamed exercise type {} \"{}\" -> \"{}\": {} exercises, {} goals updated",
                id,
                old_name,
                entity.name,
                exercises.rows_affected(),
                goals.rows_affected()
            );
        }

        tx.commit().await?;
        Ok(Some(entity))
    }

    async fn delete_exercise_type(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exercise_types WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_workout(&self, input: &NewWorkout) -> Result<Workout> {
        let created = sqlx::query_as::<_, Workout>(
            "INSERT INTO workouts (name, date, duration_minutes, notes)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(input.date)
        .bind(input.duration_minutes)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn create_workout_with_exercises(
        &self,
        input: &NewWorkout,
        exercises: &[ExerciseInput],
    ) -> Result<(Workout, Vec<Exercise>)> {
        let mut tx = self.pool.begin().await?;

        let workout = sqlx::query_as::<_, Workout>(
            "INSERT INTO workouts (name, date, duration_minutes, notes)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(input.date)
        .bind(input.duration_minutes)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let row = sqlx::query_as::<_, ExerciseRow>(
                "INSERT INTO exercises (workout_id, name, sets)
                 VALUES (?1, ?2, ?3)
                 RETURNING *",
            )
            .bind(workout.id)
            .bind(&exercise.name)
            .bind(serde_json::to_string(&exercise.sets)?)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row.into_exercise()?);
        }

        tx.commit().await?;
        Ok((workout, created))
    }

    async fn get_workout(&self, id: i64) -> Result<Option<Workout>> {
        let found = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    async fn get_all_workouts(&self) -> Result<Vec<Workout>> {
        let workouts =
            sqlx::query_as::<_, Workout>("SELECT * FROM workouts ORDER BY date DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(workouts)
    }

    async fn update_workout(&self, id: i64, patch: &WorkoutPatch) -> Result<Option<Workout>> {
        let Some(mut entity) = self.get_workout(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut entity);

        sqlx::query(
            "UPDATE workouts
             SET name = ?1, date = ?2, duration_minutes = ?3, notes = ?4
             WHERE id = ?5",
        )
        .bind(&entity.name)
        .bind(entity.date)
        .bind(entity.duration_minutes)
        .bind(&entity.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(entity))
    }

    async fn delete_workout(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM exercises WHERE workout_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_exercise(&self, input: &NewExercise) -> Result<Exercise> {
        let row = sqlx::query_as::<_, ExerciseRow>(
            "INSERT INTO exercises (workout_id, name, sets)
             VALUES (?1, ?2, ?3)
             RETURNING *",
        )
        .bind(input.workout_id)
        .bind(&input.name)
        .bind(serde_json::to_string(&input.sets)?)
        .fetch_one(&self.pool)
        .await?;
        row.into_exercise()
    }

    async fn get_exercise(&self, id: i64) -> Result<Option<Exercise>> {
        let row = sqlx::query_as::<_, ExerciseRow>("SELECT * FROM exercises WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ExerciseRow::into_exercise).transpose()
    }

    async fn get_exercises_for_workout(&self, workout_id: i64) -> Result<Vec<Exercise>> {
        let rows = sqlx::query_as::<_, ExerciseRow>(
            "SELECT * FROM exercises WHERE workout_id = ?1 ORDER BY id",
        )
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?;
        decode_exercises(rows)
    }

    async fn get_exercises_by_name(&self, name: &str) -> Result<Vec<Exercise>> {
        let rows =
            sqlx::query_as::<_, ExerciseRow>("SELECT * FROM exercises WHERE name = ?1 ORDER BY id")
                .bind(name)
                .fetch_all(&self.pool)
                .await?;
        decode_exercises(rows)
    }

    async fn update_exercise(&self, id: i64, patch: &ExercisePatch) -> Result<Option<Exercise>> {
        let Some(mut entity) = self.get_exercise(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut entity);

        sqlx::query("UPDATE exercises SET name = ?1, sets = ?2 WHERE id = ?3")
            .bind(&entity.name)
            .bind(serde_json::to_string(&entity.sets)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(entity))
    }

    async fn delete_exercise(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_goal(&self, input: &NewGoal) -> Result<Goal> {
        let created = sqlx::query_as::<_, Goal>(
            "INSERT INTO goals
                 (name, exercise_name, target_weight, target_reps, target_date,
                  is_completed, current_progress)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.exercise_name)
        .bind(input.target_weight)
        .bind(input.target_reps)
        .bind(input.target_date)
        .bind(input.current_progress)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        let found = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    async fn get_all_goals(&self) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>("SELECT * FROM goals ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(goals)
    }

    async fn update_goal(&self, id: i64, patch: &GoalPatch) -> Result<Option<Goal>> {
        let Some(mut entity) = self.get_goal(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut entity);

        sqlx::query(
            "UPDATE goals
             SET name = ?1, exercise_name = ?2, target_weight = ?3, target_reps = ?4,
                 target_date = ?5, is_completed = ?6, current_progress = ?7
             WHERE id = ?8",
        )
        .bind(&entity.name)
        .bind(&entity.exercise_name)
        .bind(entity.target_weight)
        .bind(entity.target_reps)
        .bind(entity.target_date)
        .bind(entity.is_completed)
        .bind(entity.current_progress)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(entity))
    }

    async fn delete_goal(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_workout_routine(&self, input: &NewWorkoutRoutine) -> Result<WorkoutRoutine> {
        let created = sqlx::query_as::<_, WorkoutRoutine>(
            "INSERT INTO workout_routines (name, description, category)
             VALUES (?1, ?2, ?3)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn create_routine_with_exercises(
        &self,
        input: &NewWorkoutRoutine,
        exercises: &[RoutineExerciseInput],
    ) -> Result<(WorkoutRoutine, Vec<RoutineExercise>)> {
        let mut tx = self.pool.begin().await?;

        let routine = sqlx::query_as::<_, WorkoutRoutine>(
            "INSERT INTO workout_routines (name, description, category)
             VALUES (?1, ?2, ?3)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let entry = sqlx::query_as::<_, RoutineExercise>(
                "INSERT INTO routine_exercises
                     (routine_id, exercise_type_id, order_index, default_sets,
                      default_reps, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING *",
            )
            .bind(routine.id)
            .bind(exercise.exercise_type_id)
            .bind(exercise.order_index)
            .bind(exercise.default_sets.unwrap_or(3))
            .bind(exercise.default_reps)
            .bind(&exercise.notes)
            .fetch_one(&mut *tx)
            .await?;
            created.push(entry);
        }

        tx.commit().await?;
        Ok((routine, created))
    }

    async fn get_workout_routine(&self, id: i64) -> Result<Option<WorkoutRoutine>> {
        let found =
            sqlx::query_as::<_, WorkoutRoutine>("SELECT * FROM workout_routines WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found)
    }

    async fn get_all_workout_routines(&self) -> Result<Vec<WorkoutRoutine>> {
        let routines =
            sqlx::query_as::<_, WorkoutRoutine>("SELECT * FROM workout_routines ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(routines)
    }

    async fn update_workout_routine(
        &self,
        id: i64,
        patch: &WorkoutRoutinePatch,
    ) -> Result<Option<WorkoutRoutine>> {
        let Some(mut entity) = self.get_workout_routine(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut entity);

        sqlx::query(
            "UPDATE workout_routines SET name = ?1, description = ?2, category = ?3 WHERE id = ?4",
        )
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(&entity.category)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(entity))
    }

    async fn delete_workout_routine(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM routine_exercises WHERE routine_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM workout_routines WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_routine_exercise(&self, input: &NewRoutineExercise) -> Result<RoutineExercise> {
        let created = sqlx::query_as::<_, RoutineExercise>(
            "INSERT INTO routine_exercises
                 (routine_id, exercise_type_id, order_index, default_sets,
                  default_reps, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING *",
        )
        .bind(input.routine_id)
        .bind(input.exercise_type_id)
        .bind(input.order_index)
        .bind(input.default_sets.unwrap_or(3))
        .bind(input.default_reps)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_routine_exercise(&self, id: i64) -> Result<Option<RoutineExercise>> {
        let found =
            sqlx::query_as::<_, RoutineExercise>("SELECT * FROM routine_exercises WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found)
    }

    async fn get_routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        let entries = sqlx::query_as::<_, RoutineExercise>(
            "SELECT * FROM routine_exercises WHERE routine_id = ?1 ORDER BY order_index",
        )
        .bind(routine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn update_routine_exercise(
        &self,
        id: i64,
        patch: &RoutineExercisePatch,
    ) -> Result<Option<RoutineExercise>> {
        let Some(mut entity) = self.get_routine_exercise(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut entity);

        sqlx::query(
            "UPDATE routine_exercises
             SET order_index = ?1, default_sets = ?2, default_reps = ?3, notes = ?4
             WHERE id = ?5",
        )
        .bind(entity.order_index)
        .bind(entity.default_sets)
        .bind(entity.default_reps)
        .bind(&entity.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(entity))
    }

    async fn delete_routine_exercise(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM routine_exercises WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
