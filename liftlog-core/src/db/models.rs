use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// One performed set: a weight lifted for a number of reps.
///
/// Stored as an ordered JSON array on the owning exercise row in the
/// durable store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: i64,
}

impl fmt::Display for SetEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}kg x {} reps", self.weight, self.reps)
    }
}

// Exercise type models

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ExerciseType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewExerciseType {
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseTypePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub category: Option<Option<String>>,
}

// Workout models

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub name: String,
    pub date: NaiveDate,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub duration_minutes: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
}

// Exercise models

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub workout_id: i64,
    pub name: String,
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub workout_id: i64,
    pub name: String,
    pub sets: Vec<SetEntry>,
}

/// Exercise input for a combined workout-plus-exercises create, where the
/// workout id is not known yet.
#[derive(Debug, Clone)]
pub struct ExerciseInput {
    pub name: String,
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub sets: Option<Vec<SetEntry>>,
}

// Goal models

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub exercise_name: Option<String>,
    pub target_weight: Option<f64>,
    pub target_reps: Option<i64>,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub current_progress: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub exercise_name: Option<String>,
    pub target_weight: Option<f64>,
    pub target_reps: Option<i64>,
    pub target_date: Option<NaiveDate>,
    pub current_progress: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub exercise_name: Option<Option<String>>,
    pub target_weight: Option<Option<f64>>,
    pub target_reps: Option<Option<i64>>,
    pub target_date: Option<Option<NaiveDate>>,
    pub is_completed: Option<bool>,
    pub current_progress: Option<Option<f64>>,
}

// Routine models

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WorkoutRoutine {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutRoutine {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutRoutinePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RoutineExercise {
    pub id: i64,
    pub routine_id: i64,
    pub exercise_type_id: i64,
    pub order_index: i64,
    pub default_sets: i64,
    pub default_reps: Option<i64>,
    pub notes: Option<String>,
}

/// `default_sets` falls back to 3 when not given.
#[derive(Debug, Clone)]
pub struct NewRoutineExercise {
    pub routine_id: i64,
    pub exercise_type_id: i64,
    pub order_index: i64,
    pub default_sets: Option<i64>,
    pub default_reps: Option<i64>,
    pub notes: Option<String>,
}

/// Routine exercise input for a combined routine-plus-exercises create.
#[derive(Debug, Clone)]
pub struct RoutineExerciseInput {
    pub exercise_type_id: i64,
    pub order_index: i64,
    pub default_sets: Option<i64>,
    pub default_reps: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutineExercisePatch {
    pub order_index: Option<i64>,
    pub default_sets: Option<i64>,
    pub default_reps: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
}

// Patch application. Both store backends fetch the current row, merge the
// patch over it, and write the merged entity back. A `Some` field replaces,
// a `None` field is preserved; nullable columns use the doubled option so a
// caller can clear them explicitly.

impl ExerciseTypePatch {
    /// Applies the patch and returns the previous name when it changed, so
    /// the caller can run the rename fix-up across exercises and goals.
    pub fn apply(&self, entity: &mut ExerciseType) -> Option<String> {
        let mut renamed_from = None;
        if let Some(name) = &self.name {
            if !name.is_empty() && *name != entity.name {
                renamed_from = Some(std::mem::replace(&mut entity.name, name.clone()));
            }
        }
        if let Some(description) = &self.description {
            entity.description = description.clone();
        }
        if let Some(notes) = &self.notes {
            entity.notes = notes.clone();
        }
        if let Some(category) = &self.category {
            entity.category = category.clone();
        }
        renamed_from
    }
}

impl WorkoutPatch {
    pub fn apply(&self, entity: &mut Workout) {
        // A workout never loses its name: an empty replacement keeps the
        // previous one.
        if let Some(name) = &self.name {
            if !name.is_empty() {
                entity.name = name.clone();
            }
        }
        if let Some(date) = self.date {
            entity.date = date;
        }
        if let Some(duration_minutes) = self.duration_minutes {
            entity.duration_minutes = duration_minutes;
        }
        if let Some(notes) = &self.notes {
            entity.notes = notes.clone();
        }
    }
}

impl ExercisePatch {
    pub fn apply(&self, entity: &mut Exercise) {
        // workout_id never changes on updates
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(sets) = &self.sets {
            entity.sets = sets.clone();
        }
    }
}

impl GoalPatch {
    pub fn apply(&self, entity: &mut Goal) {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(exercise_name) = &self.exercise_name {
            entity.exercise_name = exercise_name.clone();
        }
        if let Some(target_weight) = self.target_weight {
            entity.target_weight = target_weight;
        }
        if let Some(target_reps) = self.target_reps {
            entity.target_reps = target_reps;
        }
        if let Some(target_date) = self.target_date {
            entity.target_date = target_date;
        }
        if let Some(is_completed) = self.is_completed {
            entity.is_completed = is_completed;
        }
        if let Some(current_progress) = self.current_progress {
            entity.current_progress = current_progress;
        }
    }
}

impl WorkoutRoutinePatch {
    pub fn apply(&self, entity: &mut WorkoutRoutine) {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(description) = &self.description {
            entity.description = description.clone();
        }
        if let Some(category) = &self.category {
            entity.category = category.clone();
        }
    }
}

impl RoutineExercisePatch {
    pub fn apply(&self, entity: &mut RoutineExercise) {
        if let Some(order_index) = self.order_index {
            entity.order_index = order_index;
        }
        if let Some(default_sets) = self.default_sets {
            entity.default_sets = default_sets;
        }
        if let Some(default_reps) = self.default_reps {
            entity.default_reps = default_reps;
        }
        if let Some(notes) = &self.notes {
            entity.notes = notes.clone();
        }
    }
}

// Boundary-layer input checks. The stores store what they are given; shape
// validation happens before an input reaches them, mirroring where the
// HTTP layer would run its own.

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation(format!("{what} name must not be empty")));
    }
    Ok(())
}

fn require_sets(sets: &[SetEntry]) -> Result<()> {
    for set in sets {
        if set.weight < 0.0 {
            return Err(StoreError::Validation(format!(
                "set weight must not be negative, got {}",
                set.weight
            )));
        }
        if set.reps < 1 {
            return Err(StoreError::Validation(format!(
                "set reps must be at least 1, got {}",
                set.reps
            )));
        }
    }
    Ok(())
}

impl NewExerciseType {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "exercise type")
    }
}

impl NewWorkout {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "workout")
    }
}

impl NewExercise {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "exercise")?;
        require_sets(&self.sets)
    }
}

impl ExerciseInput {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "exercise")?;
        require_sets(&self.sets)
    }
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "goal")
    }
}

impl NewWorkoutRoutine {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name, "routine")
    }
}

impl NewRoutineExercise {
    pub fn validate(&self) -> Result<()> {
        if self.default_sets.is_some_and(|n| n < 1) {
            return Err(StoreError::Validation(
                "default_sets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let input = NewWorkout {
            name: "  ".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration_minutes: None,
            notes: None,
        };
        assert!(matches!(input.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn malformed_sets_are_rejected() {
        let mut input = NewExercise {
            workout_id: 1,
            name: "Bench Press".to_string(),
            sets: vec![SetEntry {
                weight: -5.0,
                reps: 5,
            }],
        };
        assert!(input.validate().is_err());

        input.sets = vec![SetEntry {
            weight: 100.0,
            reps: 0,
        }];
        assert!(input.validate().is_err());

        input.sets = vec![SetEntry {
            weight: 100.0,
            reps: 5,
        }];
        assert!(input.validate().is_ok());
    }

    #[test]
    fn default_sets_must_be_positive_when_given() {
        let input = NewRoutineExercise {
            routine_id: 1,
            exercise_type_id: 1,
            order_index: 0,
            default_sets: Some(0),
            default_reps: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }
}
