use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use liftlog::db::models::{
    ExerciseInput, ExerciseTypePatch, GoalPatch, NewExerciseType, NewGoal, NewRoutineExercise,
    NewWorkout, NewWorkoutRoutine, SetEntry,
};
use liftlog::progress;
use liftlog::{FallbackStore, RecordStore, StoreMode};

#[derive(Parser, Debug)]
#[command(version, about = "Liftlog - workout tracker CLI", long_about = None)]
struct Args {
    /// SQLite database file.
    #[arg(long, env = "DATABASE_URL", default_value = "liftlog.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage workouts.
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Manage exercise types.
    Type {
        #[command(subcommand)]
        command: TypeCommands,
    },
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Manage workout routines.
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },
    /// Print the progress history for an exercise, oldest first.
    History {
        name: String,
        /// Only the most recent N entries.
        #[arg(long)]
        limit: Option<usize>,
        /// Also report rows skipped for missing workouts or empty set lists.
        #[arg(long)]
        counts: bool,
    },
    /// Print the heaviest set from the most recent workout for an exercise.
    Latest { name: String },
    /// Report which storage backend is serving requests.
    Status,
}

#[derive(Subcommand, Debug)]
enum WorkoutCommands {
    List,
    Show {
        id: i64,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Workout date, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        duration: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
        /// Exercise with its sets, e.g. "Bench Press=100x5,90x8".
        /// Repeatable.
        #[arg(long = "exercise")]
        exercises: Vec<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum TypeCommands {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a type; exercises and goals recorded under the old name
    /// follow along.
    Rename {
        id: i64,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum GoalCommands {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        exercise: Option<String>,
        #[arg(long)]
        target_weight: Option<f64>,
        #[arg(long)]
        target_reps: Option<i64>,
        /// Target date, YYYY-MM-DD.
        #[arg(long)]
        target_date: Option<NaiveDate>,
    },
    Complete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum RoutineCommands {
    List,
    Show {
        id: i64,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Append an exercise type to a routine's template.
    AddExercise {
        #[arg(long)]
        routine: i64,
        /// Exercise type name; must already exist.
        #[arg(long)]
        type_name: String,
        #[arg(long)]
        order: i64,
        #[arg(long)]
        sets: Option<i64>,
        #[arg(long)]
        reps: Option<i64>,
    },
}

/// Parses "100x5,90x8" into set entries.
fn parse_sets(input: &str) -> Result<Vec<SetEntry>> {
    input
        .split(',')
        .map(|part| {
            let (weight, reps) = part
                .trim()
                .split_once('x')
                .with_context(|| format!("expected WEIGHTxREPS, got \"{part}\""))?;
            Ok(SetEntry {
                weight: weight.trim().parse().with_context(|| format!("bad weight in \"{part}\""))?,
                reps: reps.trim().parse().with_context(|| format!("bad reps in \"{part}\""))?,
            })
        })
        .collect()
}

/// Parses "Bench Press=100x5,90x8" into an exercise input.
fn parse_exercise_arg(input: &str) -> Result<ExerciseInput> {
    let (name, sets) = input
        .split_once('=')
        .with_context(|| format!("expected NAME=SETS, got \"{input}\""))?;
    Ok(ExerciseInput {
        name: name.trim().to_string(),
        sets: parse_sets(sets)?,
    })
}

fn mode_label(mode: StoreMode) -> &'static str {
    match mode {
        StoreMode::Durable => "durable (sqlite)",
        StoreMode::Fallback => "in-memory fallback",
    }
}

async fn run_workout(store: &FallbackStore, command: WorkoutCommands) -> Result<()> {
    match command {
        WorkoutCommands::List => {
            for workout in store.get_all_workouts().await? {
                let duration = workout
                    .duration_minutes
                    .map(|m| format!(", {m} min"))
                    .unwrap_or_default();
                println!("#{} {} ({}{})", workout.id, workout.name, workout.date, duration);
            }
        }
        WorkoutCommands::Show { id } => {
            let Some(workout) = store.get_workout(id).await? else {
                bail!("workout {id} not found");
            };
            println!("#{} {} ({})", workout.id, workout.name, workout.date);
            if let Some(notes) = &workout.notes {
                println!("  notes: {notes}");
            }
            for exercise in store.get_exercises_for_workout(id).await? {
                let sets: Vec<String> = exercise.sets.iter().map(|s| s.to_string()).collect();
                println!("  {}: {}", exercise.name, sets.join(", "));
            }
        }
        WorkoutCommands::Add {
            name,
            date,
            duration,
            notes,
            exercises,
        } => {
            let input = NewWorkout {
                name,
                date,
                duration_minutes: duration,
                notes,
            };
            input.validate()?;
            let exercises = exercises
                .iter()
                .map(|raw| parse_exercise_arg(raw))
                .collect::<Result<Vec<_>>>()?;
            for exercise in &exercises {
                exercise.validate()?;
            }

            let (workout, created) =
                store.create_workout_with_exercises(&input, &exercises).await?;
            println!(
                "created workout #{} with {} exercises",
                workout.id,
                created.len()
            );
        }
        WorkoutCommands::Delete { id } => {
            if store.delete_workout(id).await? {
                println!("deleted workout #{id}");
            } else {
                bail!("workout {id} not found");
            }
        }
    }
    Ok(())
}

async fn run_type(store: &FallbackStore, command: TypeCommands) -> Result<()> {
    match command {
        TypeCommands::List => {
            for exercise_type in store.get_all_exercise_types().await? {
                let category = exercise_type
                    .category
                    .map(|c| format!(" [{c}]"))
                    .unwrap_or_default();
                println!("#{} {}{}", exercise_type.id, exercise_type.name, category);
            }
        }
        TypeCommands::Add {
            name,
            category,
            description,
        } => {
            let input = NewExerciseType {
                name,
                description,
                notes: None,
                category,
            };
            input.validate()?;
            let created = store.create_exercise_type(&input).await?;
            println!("created exercise type #{} {}", created.id, created.name);
        }
        TypeCommands::Rename { id, name } => {
            let patch = ExerciseTypePatch {
                name: Some(name),
                ..Default::default()
            };
            let Some(renamed) = store.update_exercise_type(id, &patch).await? else {
                bail!("exercise type {id} not found");
            };
            println!("renamed exercise type #{} to {}", id, renamed.name);
        }
    }
    Ok(())
}

async fn run_goal(store: &FallbackStore, command: GoalCommands) -> Result<()> {
    match command {
        GoalCommands::List => {
            for goal in store.get_all_goals().await? {
                let state = if goal.is_completed { "done" } else { "open" };
                let target = match (goal.target_weight, goal.target_reps) {
                    (Some(w), Some(r)) => format!(" target {w:.1}kg x {r}"),
                    (Some(w), None) => format!(" target {w:.1}kg"),
                    _ => String::new(),
                };
                println!("#{} [{}] {}{}", goal.id, state, goal.name, target);
            }
        }
        GoalCommands::Add {
            name,
            exercise,
            target_weight,
            target_reps,
            target_date,
        } => {
            if let Some(exercise_name) = &exercise {
                if store
                    .get_exercise_type_by_name(exercise_name)
                    .await?
                    .is_none()
                {
                    println!("note: no exercise type named \"{exercise_name}\" exists yet");
                }
            }
            let input = NewGoal {
                name,
                exercise_name: exercise,
                target_weight,
                target_reps,
                target_date,
                current_progress: None,
            };
            input.validate()?;
            let created = store.create_goal(&input).await?;
            println!("created goal #{} {}", created.id, created.name);
        }
        GoalCommands::Complete { id } => {
            let patch = GoalPatch {
                is_completed: Some(true),
                ..Default::default()
            };
            let Some(goal) = store.update_goal(id, &patch).await? else {
                bail!("goal {id} not found");
            };
            println!("completed goal #{} {}", goal.id, goal.name);
        }
    }
    Ok(())
}

async fn run_routine(store: &FallbackStore, command: RoutineCommands) -> Result<()> {
    match command {
        RoutineCommands::List => {
            for routine in store.get_all_workout_routines().await? {
                println!("#{} {}", routine.id, routine.name);
            }
        }
        RoutineCommands::Show { id } => {
            let Some(routine) = store.get_workout_routine(id).await? else {
                bail!("routine {id} not found");
            };
            println!("#{} {}", routine.id, routine.name);
            if let Some(description) = &routine.description {
                println!("  {description}");
            }
            for entry in store.get_routine_exercises(id).await? {
                let type_name = store
                    .get_exercise_type(entry.exercise_type_id)
                    .await?
                    .map(|t| t.name)
                    .unwrap_or_else(|| format!("type #{}", entry.exercise_type_id));
                let reps = entry
                    .default_reps
                    .map(|r| format!(" x {r}"))
                    .unwrap_or_default();
                println!(
                    "  {}. {} ({} sets{})",
                    entry.order_index, type_name, entry.default_sets, reps
                );
            }
        }
        RoutineCommands::Add {
            name,
            description,
            category,
        } => {
            let input = NewWorkoutRoutine {
                name,
                description,
                category,
            };
            input.validate()?;
            let created = store.create_workout_routine(&input).await?;
            println!("created routine #{} {}", created.id, created.name);
        }
        RoutineCommands::AddExercise {
            routine,
            type_name,
            order,
            sets,
            reps,
        } => {
            let Some(exercise_type) = store.get_exercise_type_by_name(&type_name).await? else {
                bail!("no exercise type named \"{type_name}\"");
            };
            let input = NewRoutineExercise {
                routine_id: routine,
                exercise_type_id: exercise_type.id,
                order_index: order,
                default_sets: sets,
                default_reps: reps,
                notes: None,
            };
            input.validate()?;
            let created = store.create_routine_exercise(&input).await?;
            println!(
                "added {} to routine #{} at position {}",
                type_name, routine, created.order_index
            );
        }
    }
    Ok(())
}

async fn run_history(
    store: &FallbackStore,
    name: &str,
    limit: Option<usize>,
    counts: bool,
) -> Result<()> {
    if counts {
        let report = progress::exercise_history_report(store, name).await?;
        for point in &report.points {
            println!("{}  {:.1}kg x {}", point.date, point.weight, point.reps);
        }
        println!(
            "({} points, {} orphaned rows skipped, {} empty rows skipped)",
            report.points.len(),
            report.skipped_orphans,
            report.skipped_empty
        );
        return Ok(());
    }

    let points = match limit {
        Some(limit) => progress::exercise_sets(store, name, limit).await?,
        None => progress::exercise_history(store, name).await?,
    };
    if points.is_empty() {
        println!("no history for \"{name}\"");
        return Ok(());
    }
    for point in points {
        println!("{}  {:.1}kg x {}", point.date, point.weight, point.reps);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let store = FallbackStore::connect(&args.db).await;

    match args.command {
        Commands::Workout { command } => run_workout(&store, command).await?,
        Commands::Type { command } => run_type(&store, command).await?,
        Commands::Goal { command } => run_goal(&store, command).await?,
        Commands::Routine { command } => run_routine(&store, command).await?,
        Commands::History {
            name,
            limit,
            counts,
        } => run_history(&store, &name, limit, counts).await?,
        Commands::Latest { name } => match progress::latest_exercise_set(&store, &name).await? {
            Some(set) => println!("{set}"),
            None => println!("no sets recorded for \"{name}\""),
        },
        Commands::Status => {
            // touch the store so a dead database is actually noticed
            let workouts = store.get_all_workouts().await?;
            println!(
                "storage: {} ({} workouts)",
                mode_label(store.mode()),
                workouts.len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_exercise_arg, parse_sets};

    #[test]
    fn sets_parse_from_compact_notation() {
        let sets = parse_sets("100x5, 90x8").unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].weight, 100.0);
        assert_eq!(sets[1].reps, 8);

        assert!(parse_sets("100").is_err());
        assert!(parse_sets("axb").is_err());
    }

    #[test]
    fn exercise_arg_splits_name_and_sets() {
        let exercise = parse_exercise_arg("Bench Press=100x5,90x8").unwrap();
        assert_eq!(exercise.name, "Bench Press");
        assert_eq!(exercise.sets.len(), 2);

        assert!(parse_exercise_arg("Bench Press").is_err());
    }
}
