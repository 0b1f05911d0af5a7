//! ironlog - Strength training log with progressive overload

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use ironlog::analytics::calendar::{is_current_week, shift_week, week_days, week_key};
use ironlog::analytics::{
    ChartKind, ChartRange, HistoricalMaxCache, Locale, PlannedExercise, Set, best_pr_keys,
    build_day_completions, calculate_momentum, calculate_streak, compute_frequency_points,
    compute_overload_suggestion, compute_strength_points, compute_volume_points, detect_prs,
    estimate_duration, format_volume, local_date, milestone_for, month_grid, nice_axis_scale,
    next_day_index, pr_dates, range_days,
};
use ironlog::db::{Database, Exercise, HISTORY_SESSIONS};
use ironlog::muscles::MuscleGroup;

#[derive(Parser)]
#[command(name = "ironlog")]
#[command(author, version, about = "Strength training log with progressive overload")]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "IRONLOG_DB", default_value = "ironlog.db", global = true)]
    db: String,

    /// Locale for number formatting (e.g. en-US, de-DE)
    #[arg(long, env = "IRONLOG_LOCALE", default_value = "en-US", global = true)]
    locale: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or update an exercise
    Exercise {
        id: String,
        name: String,
        /// Primary muscle (chest, back, quads, ...)
        #[arg(short, long)]
        muscle: MuscleGroup,
    },

    /// Add or update a program day
    Day {
        id: String,
        name: String,
        /// Position in the rotation
        #[arg(short, long, default_value = "0")]
        position: i64,
    },

    /// Plan an exercise on a program day
    Plan {
        day: String,
        exercise: String,
        #[arg(short, long, default_value = "3")]
        sets: u32,
        #[arg(short, long)]
        reps: Option<u32>,
        /// Rest between sets in seconds
        #[arg(long)]
        rest: Option<u32>,
    },

    /// Start a workout
    Start {
        /// Program day being followed
        #[arg(short, long)]
        day: Option<String>,
    },

    /// Log a completed set
    Log {
        session: i64,
        exercise: String,
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        reps: Option<u32>,
        #[arg(long)]
        rpe: Option<f64>,
        #[arg(long)]
        warmup: bool,
    },

    /// Finish a workout and record PRs
    Finish { session: i64 },

    /// Suggest the next working weight
    Suggest {
        exercise: String,
        /// Target reps, defaults to the planned or last performed reps
        #[arg(short, long)]
        reps: Option<u32>,
        /// Program day to read planned reps from
        #[arg(short, long)]
        day: Option<String>,
    },

    /// Volume momentum of a workout in progress
    Momentum { session: i64 },

    /// Live PR status of a workout in progress
    Records { session: i64 },

    /// Weekly training streak
    Streak,

    /// Next program day in the rotation
    NextDay,

    /// Chart series for an exercise
    Chart {
        exercise: String,
        /// strength, volume or frequency
        #[arg(short, long, default_value = "strength")]
        kind: ChartKind,
        /// 1m, 3m, 6m, 1y or all
        #[arg(short, long, default_value = "3m")]
        range: ChartRange,
    },

    /// Sessions in a week, relative to this one
    Week {
        /// Weeks to move, negative for the past
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },

    /// Month calendar with training days marked
    Calendar {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        month: Option<u32>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session_dates(db: &Database) -> Result<Vec<NaiveDate>> {
    Ok(db
        .completed_session_starts()?
        .iter()
        .map(|ts| local_date(ts, &Local))
        .collect())
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let locale: Locale = cli.locale.parse()?;
    let db = Database::open(&cli.db)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Exercise { id, name, muscle } => {
            let exercise = Exercise {
                id,
                name,
                muscle_primary: muscle.name().to_string(),
            };
            db.upsert_exercise(&exercise)?;
            println!("Saved: {} ({})", exercise.name, exercise.muscle_primary);
        }

        Commands::Day { id, name, position } => {
            db.upsert_program_day(&id, &name, position)?;
            println!("Saved day: {} at position {}", name, position);
        }

        Commands::Plan { day, exercise, sets, reps, rest } => {
            let planned = PlannedExercise {
                exercise_id: exercise.clone(),
                sets_target: sets,
                reps_target: reps,
                rest_seconds: rest,
            };
            db.add_planned_exercise(&day, &planned)?;
            println!("Planned: {} {}x{} on {}", exercise, sets, reps.map_or("-".to_string(), |r| r.to_string()), day);
        }

        Commands::Start { day } => {
            let id = db.start_session(Utc::now(), day.as_deref())?;
            info!("Workout {} started", id);
            println!("Started workout {}", id);
        }

        Commands::Log { session, exercise, weight, reps, rpe, warmup } => {
            db.ensure_open_session(session)?;

            let set = Set {
                exercise_id: exercise.clone(),
                set_number: db.next_set_number(session, &exercise)?,
                weight_kg: weight,
                reps,
                rpe,
                is_warmup: warmup,
                is_completed: true,
                completed_at: Some(Utc::now()),
            };
            db.add_set(session, &set)?;
            println!(
                "Logged: {} set {} - {} kg x {}",
                exercise,
                set.set_number,
                weight.map_or("BW".to_string(), |w| w.to_string()),
                reps.unwrap_or(0)
            );

            let mut cache = HistoricalMaxCache::new();
            cache.load_missing(&db, &[exercise.clone()])?;
            let active = db.active_exercises(session)?;
            if let Some(state) = active
                .iter()
                .find(|e| e.exercise_id == exercise)
                .and_then(|e| cache.pr_state(e))
                .filter(|s| s.is_pr)
            {
                println!("New PR! {} kg (+{} kg)", state.new_max, state.delta);
            }
        }

        Commands::Finish { session } => {
            db.ensure_open_session(session)?;

            let sets = db.session_sets(session)?;
            let ids: Vec<String> = sets
                .iter()
                .map(|s| s.exercise_id.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            // Read maxima before completing, so this workout is still excluded
            let history = db.historical_maxes(&ids)?;
            let prs = best_pr_keys(&detect_prs(&sets, &history));
            db.mark_prs(session, &prs)?;
            db.complete_session(session, Utc::now())?;

            let volume: f64 = sets.iter().filter(|s| s.is_working()).map(Set::volume).sum();
            info!("Workout {} finished with {} PRs", session, prs.len());

            if cli.json {
                print_json(&prs)?;
            } else {
                println!("Workout {} finished - {}", session, format_volume(volume, &locale));
                for key in &prs {
                    println!("  PR: {} {} kg", key.exercise_id, key.weight_kg);
                }
            }
        }

        Commands::Suggest { exercise, reps, day } => {
            let history = db.recent_history(&exercise, HISTORY_SESSIONS)?;
            let muscle = db
                .get_exercise(&exercise)?
                .map(|e| e.muscle_primary)
                .unwrap_or_default();
            let target = match (reps, day) {
                (Some(r), _) => Some(r),
                (None, Some(day)) => db.planned_reps(&day, &exercise)?,
                (None, None) => None,
            };
            debug!("Suggest {} from {} sessions, target {:?}", exercise, history.len(), target);

            let suggestion = compute_overload_suggestion(&history, target, &muscle);
            if cli.json {
                print_json(&suggestion)?;
            } else {
                match suggestion {
                    Some(s) => println!("{}: {} kg x {} ({}) - {}", exercise, s.weight, s.reps, s.kind, s.reason),
                    None => println!("{}: no suggestion, keep logging", exercise),
                }
            }
        }

        Commands::Momentum { session } => {
            db.ensure_open_session(session)?;

            let active = db.active_exercises(session)?;
            let mut history = HashMap::new();
            for exercise in &active {
                history.insert(
                    exercise.exercise_id.clone(),
                    db.recent_history(&exercise.exercise_id, 1)?,
                );
            }

            let momentum = calculate_momentum(&active, &history);
            if cli.json {
                print_json(&momentum)?;
            } else {
                match momentum {
                    Some(m) => println!("Momentum: {:+}% ({:?})", m.percentage, m.direction),
                    None => println!("Momentum: not enough history"),
                }
            }
        }

        Commands::Records { session } => {
            db.ensure_open_session(session)?;

            let active = db.active_exercises(session)?;
            let ids: Vec<String> = active.iter().map(|e| e.exercise_id.clone()).collect();
            let mut cache = HistoricalMaxCache::new();
            cache.load_missing(&db, &ids)?;

            let states: Vec<_> = active
                .iter()
                .map(|e| (e.exercise_id.clone(), cache.pr_state(e)))
                .collect();
            if cli.json {
                print_json(&states)?;
            } else {
                for (id, state) in states {
                    match state {
                        Some(s) if s.is_pr => println!("{:20} PR {} kg (+{} kg)", id, s.new_max, s.delta),
                        Some(s) => println!("{:20} best {} kg, record {} kg", id, s.new_max, s.previous_max),
                        None => println!("{:20} -", id),
                    }
                }
            }
        }

        Commands::Streak => {
            let streak = calculate_streak(&session_dates(&db)?, today);
            if cli.json {
                print_json(&streak)?;
            } else {
                println!("Current streak: {} weeks", streak.current_streak);
                println!("Longest streak: {} weeks", streak.longest_streak);
                println!("Active weeks:   {}", streak.total_weeks_active);
                if let Some(milestone) = milestone_for(streak.current_streak) {
                    println!("Milestone: {} weeks ({})", milestone.weeks(), milestone.key());
                }
            }
        }

        Commands::NextDay => {
            let days = db.program_days()?;
            if days.is_empty() {
                println!("No program days yet");
                return Ok(());
            }
            let ids: Vec<&str> = days.iter().map(|d| d.id.as_str()).collect();
            let last = db.last_completed_day()?;
            let next = &days[next_day_index(&ids, last.as_deref())];
            let completions = build_day_completions(&db.day_sessions()?, &ids);

            if cli.json {
                print_json(next)?;
            } else {
                println!("Next: {} (~{} min)", next.name, estimate_duration(&next.exercises));
                for day in &days {
                    let done = completions
                        .get(&day.id)
                        .map_or("never".to_string(), |ts| local_date(ts, &Local).to_string());
                    println!("  {:20} last done {}", day.name, done);
                }
            }
        }

        Commands::Chart { exercise, kind, range } => {
            let since = range.start(today);
            let (sessions, sets) = db.chart_rows(&exercise, since, &Local)?;

            let points: Vec<(NaiveDate, f64)> = match kind {
                ChartKind::Strength => compute_strength_points(&sessions, &sets, range)
                    .into_iter()
                    .map(|p| (p.date, p.estimated_max_1rm))
                    .collect(),
                ChartKind::Volume => compute_volume_points(&sessions, &sets, range)
                    .into_iter()
                    .map(|p| (p.date, p.total_volume))
                    .collect(),
                ChartKind::Frequency => compute_frequency_points(&db.chart_sessions(since, &Local)?)
                    .into_iter()
                    .map(|p| (p.date, p.count as f64))
                    .collect(),
            };

            if points.is_empty() {
                match range_days(range, today) {
                    Some(days) => println!("No data in the last {} days", days),
                    None => println!("No data yet"),
                }
                return Ok(());
            }

            let max = points.iter().map(|(_, v)| *v).fold(0.0, f64::max);
            let scale = nice_axis_scale(max);
            if cli.json {
                print_json(&serde_json::json!({ "points": points, "axis": scale }))?;
            } else {
                let prs = pr_dates(&sessions, &sets);
                println!("Axis: 0..{} step {}", scale.max_value, scale.step_value);
                for (date, value) in points {
                    let width = (value / scale.max_value * 40.0).round() as usize;
                    let mark = if prs.contains(&date) { " *" } else { "" };
                    println!("{} {:>8.1} {}{}", date, value, "#".repeat(width), mark);
                }
            }
        }

        Commands::Week { offset } => {
            let start = shift_week(today, offset);
            let dates: HashSet<NaiveDate> = session_dates(&db)?.into_iter().collect();
            let current = if is_current_week(start, today) { " (this week)" } else { "" };

            println!("Week of {}{}", week_key(start), current);
            for day in week_days(start) {
                let mark = if dates.contains(&day) { "x" } else { "." };
                println!("  {} {} {}", day.format("%a"), day, mark);
            }
        }

        Commands::Calendar { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let grid = month_grid(year, month)?;
            let dates: HashSet<NaiveDate> = session_dates(&db)?.into_iter().collect();

            println!("{}-{:02}", year, month);
            println!(" Mo Tu We Th Fr Sa Su");
            for row in grid {
                let line: String = row
                    .iter()
                    .map(|cell| match cell {
                        Some(d) if dates.contains(d) => format!("{:>2}*", d.day()),
                        Some(d) => format!("{:>3}", d.day()),
                        None => "   ".to_string(),
                    })
                    .collect();
                println!("{}", line);
            }
        }
    }

    Ok(())
}
