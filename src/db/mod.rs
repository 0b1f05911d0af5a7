//! Database module - SQLite storage for sessions, sets and programs
//!
//! This is the data-fetch side the analytics engine is fed from. Queries return
//! the shapes the engine expects: history pre-filtered to working sets and
//! sorted newest first, maxima that skip the workout in progress, and raw rows
//! for charts.
//!
//! Timestamps are stored as RFC 3339 text and always ordered through
//! `julianday()`, so rows written with other offsets still sort by instant.

use std::collections::HashMap;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::calendar::local_date;
use crate::analytics::{
    ActiveExercise, ChartSession, ChartSet, DaySession, HistorySet, MaxSource, PlannedExercise,
    PrKey, SessionHistory, Set,
};

/// Sessions kept per exercise for overload decisions
pub const HISTORY_SESSIONS: usize = 2;

/// Exercise catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_primary: String,
}

/// Program day with its planned exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDay {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub exercises: Vec<PlannedExercise>,
}

/// Outcome of checking whether a locally remembered session still exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    Valid,
    /// The store answered and the session is gone
    Orphaned,
    /// The store could not answer; keep local state
    AssumeValid,
}

/// Turn an existence lookup into a decision. Failures never discard local state.
pub fn check_orphan(lookup: Result<bool>) -> SessionCheck {
    match lookup {
        Ok(true) => SessionCheck::Valid,
        Ok(false) => SessionCheck::Orphaned,
        Err(e) => {
            warn!("Session check failed, assuming valid: {}", e);
            SessionCheck::AssumeValid
        }
    }
}

fn parse_ts(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        info!("Opened database at {}", path);
        Ok(db)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                muscle_primary TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                program_day_id TEXT
            );
            CREATE TABLE IF NOT EXISTS sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                exercise_id TEXT NOT NULL,
                set_number INTEGER NOT NULL,
                weight_kg REAL,
                reps INTEGER,
                rpe REAL,
                is_warmup INTEGER NOT NULL DEFAULT 0,
                is_completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                is_pr INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_sets_exercise ON sets(exercise_id);
            CREATE TABLE IF NOT EXISTS program_days (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                position INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS program_day_exercises (
                day_id TEXT NOT NULL REFERENCES program_days(id),
                exercise_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                sets_target INTEGER NOT NULL,
                reps_target INTEGER,
                rest_seconds INTEGER
            );",
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Catalog and program
    // ------------------------------------------------------------------

    pub fn upsert_exercise(&self, exercise: &Exercise) -> Result<()> {
        self.conn.execute(
            "INSERT INTO exercises (id, name, muscle_primary) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, muscle_primary = excluded.muscle_primary",
            params![exercise.id, exercise.name, exercise.muscle_primary],
        )?;
        Ok(())
    }

    pub fn get_exercise(&self, id: &str) -> Result<Option<Exercise>> {
        let exercise = self
            .conn
            .query_row(
                "SELECT id, name, muscle_primary FROM exercises WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Exercise {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        muscle_primary: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(exercise)
    }

    pub fn upsert_program_day(&self, id: &str, name: &str, position: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO program_days (id, name, position) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, position = excluded.position",
            params![id, name, position],
        )?;
        Ok(())
    }

    pub fn add_planned_exercise(&self, day_id: &str, planned: &PlannedExercise) -> Result<()> {
        let position: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM program_day_exercises WHERE day_id = ?1",
            params![day_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO program_day_exercises
                (day_id, exercise_id, position, sets_target, reps_target, rest_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                day_id,
                planned.exercise_id,
                position,
                planned.sets_target,
                planned.reps_target,
                planned.rest_seconds,
            ],
        )?;
        Ok(())
    }

    /// Program days in rotation order
    pub fn program_days(&self) -> Result<Vec<ProgramDay>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, position FROM program_days ORDER BY position, id")?;
        let mut days = stmt
            .query_map([], |row| {
                Ok(ProgramDay {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    position: row.get(2)?,
                    exercises: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, sets_target, reps_target, rest_seconds
             FROM program_day_exercises WHERE day_id = ?1 ORDER BY position",
        )?;
        for day in &mut days {
            day.exercises = stmt
                .query_map(params![day.id], |row| {
                    Ok(PlannedExercise {
                        exercise_id: row.get(0)?,
                        sets_target: row.get(1)?,
                        reps_target: row.get(2)?,
                        rest_seconds: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(days)
    }

    /// Planned reps for an exercise on a given day, if the program sets one
    pub fn planned_reps(&self, day_id: &str, exercise_id: &str) -> Result<Option<u32>> {
        let reps = self
            .conn
            .query_row(
                "SELECT reps_target FROM program_day_exercises
                 WHERE day_id = ?1 AND exercise_id = ?2 ORDER BY position LIMIT 1",
                params![day_id, exercise_id],
                |row| row.get::<_, Option<u32>>(0),
            )
            .optional()?;
        Ok(reps.flatten())
    }

    // ------------------------------------------------------------------
    // Sessions and sets
    // ------------------------------------------------------------------

    pub fn start_session(&self, started_at: DateTime<Utc>, program_day_id: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (started_at, program_day_id) VALUES (?1, ?2)",
            params![started_at.to_rfc3339(), program_day_id],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Started session {}", id);
        Ok(id)
    }

    pub fn complete_session(&self, session_id: i64, completed_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE sessions SET completed_at = ?1 WHERE id = ?2",
            params![completed_at.to_rfc3339(), session_id],
        )?;
        Ok(())
    }

    pub fn session_exists(&self, session_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Started and not yet finished
    pub fn is_session_open(&self, session_id: i64) -> Result<bool> {
        let open: Option<bool> = self
            .conn
            .query_row(
                "SELECT completed_at IS NULL FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(open.unwrap_or(false))
    }

    /// Refuse a session the store has definitely lost or that is already
    /// finished. An unreachable store keeps local state.
    pub fn ensure_open_session(&self, session_id: i64) -> Result<()> {
        match check_orphan(self.session_exists(session_id)) {
            SessionCheck::Orphaned => bail!("Session {} no longer exists", session_id),
            SessionCheck::AssumeValid => Ok(()),
            SessionCheck::Valid => {
                if !self.is_session_open(session_id)? {
                    bail!("Session {} is already finished", session_id);
                }
                Ok(())
            }
        }
    }

    /// Next 1-based set number for an exercise within a session
    pub fn next_set_number(&self, session_id: i64, exercise_id: &str) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sets WHERE session_id = ?1 AND exercise_id = ?2",
            params![session_id, exercise_id],
            |row| row.get(0),
        )?;
        Ok(count + 1)
    }

    pub fn add_set(&self, session_id: i64, set: &Set) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sets
                (session_id, exercise_id, set_number, weight_kg, reps, rpe,
                 is_warmup, is_completed, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session_id,
                set.exercise_id,
                set.set_number,
                set.weight_kg,
                set.reps,
                set.rpe,
                set.is_warmup,
                set.is_completed,
                set.completed_at.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All sets of a session in the order they were logged
    pub fn session_sets(&self, session_id: i64) -> Result<Vec<Set>> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, set_number, weight_kg, reps, rpe, is_warmup, is_completed, completed_at
             FROM sets WHERE session_id = ?1 ORDER BY id",
        )?;
        let sets = stmt
            .query_map(params![session_id], |row| {
                let completed_at: Option<String> = row.get(7)?;
                Ok(Set {
                    exercise_id: row.get(0)?,
                    set_number: row.get(1)?,
                    weight_kg: row.get(2)?,
                    reps: row.get(3)?,
                    rpe: row.get(4)?,
                    is_warmup: row.get(5)?,
                    is_completed: row.get(6)?,
                    completed_at: completed_at.map(|s| parse_ts(7, s)).transpose()?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    /// Sets of a session grouped per exercise, exercises in first-logged order
    pub fn active_exercises(&self, session_id: i64) -> Result<Vec<ActiveExercise>> {
        let mut exercises: Vec<ActiveExercise> = Vec::new();
        for set in self.session_sets(session_id)? {
            match exercises.iter_mut().find(|e| e.exercise_id == set.exercise_id) {
                Some(exercise) => exercise.sets.push(set),
                None => exercises.push(ActiveExercise {
                    exercise_id: set.exercise_id.clone(),
                    sets: vec![set],
                }),
            }
        }
        Ok(exercises)
    }

    /// Flag the first matching working set of each key as a PR
    pub fn mark_prs(&self, session_id: i64, keys: &[PrKey]) -> Result<usize> {
        let mut marked = 0;
        for key in keys {
            marked += self.conn.execute(
                "UPDATE sets SET is_pr = 1 WHERE id = (
                    SELECT id FROM sets
                    WHERE session_id = ?1 AND exercise_id = ?2 AND weight_kg = ?3
                      AND is_warmup = 0 AND is_completed = 1
                    ORDER BY set_number LIMIT 1
                 )",
                params![session_id, key.exercise_id, key.weight_kg],
            )?;
        }
        Ok(marked)
    }

    // ------------------------------------------------------------------
    // Engine inputs
    // ------------------------------------------------------------------

    /// Most recent completed sessions containing working sets of an exercise,
    /// newest first, each restricted to that exercise's working sets.
    pub fn recent_history(&self, exercise_id: &str, limit: usize) -> Result<Vec<SessionHistory>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.started_at FROM sessions s
             WHERE s.completed_at IS NOT NULL
               AND EXISTS (
                 SELECT 1 FROM sets t
                 WHERE t.session_id = s.id AND t.exercise_id = ?1
                   AND t.is_warmup = 0 AND t.is_completed = 1
               )
             ORDER BY julianday(s.started_at) DESC
             LIMIT ?2",
        )?;
        let sessions = stmt
            .query_map(params![exercise_id, limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, parse_ts(1, row.get(1)?)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sets_stmt = self.conn.prepare(
            "SELECT weight_kg, reps, rpe FROM sets
             WHERE session_id = ?1 AND exercise_id = ?2 AND is_warmup = 0 AND is_completed = 1
             ORDER BY set_number",
        )?;

        let mut history = Vec::with_capacity(sessions.len());
        for (session_id, started_at) in sessions {
            let sets = sets_stmt
                .query_map(params![session_id, exercise_id], |row| {
                    Ok(HistorySet {
                        weight_kg: row.get(0)?,
                        reps: row.get(1)?,
                        rpe: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            history.push(SessionHistory { started_at, sets });
        }

        debug!("Loaded {} history sessions for {}", history.len(), exercise_id);
        Ok(history)
    }

    /// Heaviest working weight per exercise across completed sessions only,
    /// so the workout in progress never counts against itself.
    pub fn historical_maxes(&self, exercise_ids: &[String]) -> Result<HashMap<String, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.exercise_id, MAX(t.weight_kg) FROM sets t
             JOIN sessions s ON s.id = t.session_id
             WHERE s.completed_at IS NOT NULL
               AND t.is_warmup = 0 AND t.is_completed = 1 AND t.weight_kg IS NOT NULL
             GROUP BY t.exercise_id",
        )?;
        let maxes = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .filter(|r| r.as_ref().map_or(true, |(id, _)| exercise_ids.contains(id)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(maxes)
    }

    /// Start times of every completed session
    pub fn completed_session_starts(&self) -> Result<Vec<DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT started_at FROM sessions WHERE completed_at IS NOT NULL ORDER BY julianday(started_at)",
        )?;
        let starts = stmt
            .query_map([], |row| parse_ts(0, row.get(0)?))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(starts)
    }

    /// Completed sessions with the program day they followed
    pub fn day_sessions(&self) -> Result<Vec<DaySession>> {
        let mut stmt = self.conn.prepare(
            "SELECT program_day_id, started_at FROM sessions WHERE completed_at IS NOT NULL",
        )?;
        let sessions = stmt
            .query_map([], |row| {
                Ok(DaySession {
                    program_day_id: row.get(0)?,
                    started_at: parse_ts(1, row.get(1)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Program day of the latest completed session that followed one
    pub fn last_completed_day(&self) -> Result<Option<String>> {
        let day = self
            .conn
            .query_row(
                "SELECT program_day_id FROM sessions
                 WHERE completed_at IS NOT NULL AND program_day_id IS NOT NULL
                 ORDER BY julianday(started_at) DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(day)
    }

    /// Completed sessions on or after `since`, dated in `tz`
    pub fn chart_sessions<Tz: TimeZone>(
        &self,
        since: Option<NaiveDate>,
        tz: &Tz,
    ) -> Result<Vec<ChartSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at FROM sessions WHERE completed_at IS NOT NULL ORDER BY julianday(started_at)",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, parse_ts(1, row.get(1)?)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, started_at)| ChartSession {
                id,
                date: local_date(&started_at, tz),
            })
            .filter(|s| since.is_none_or(|d| s.date >= d))
            .collect())
    }

    /// Raw rows for an exercise's charts, scoped to `since`
    pub fn chart_rows<Tz: TimeZone>(
        &self,
        exercise_id: &str,
        since: Option<NaiveDate>,
        tz: &Tz,
    ) -> Result<(Vec<ChartSession>, Vec<ChartSet>)> {
        let sessions = self.chart_sessions(since, tz)?;

        let mut stmt = self.conn.prepare(
            "SELECT session_id, exercise_id, weight_kg, reps, is_warmup, is_pr
             FROM sets WHERE exercise_id = ?1 AND is_completed = 1 ORDER BY id",
        )?;
        let sets = stmt
            .query_map(params![exercise_id], |row| {
                Ok(ChartSet {
                    session_id: row.get(0)?,
                    exercise_id: row.get(1)?,
                    weight_kg: row.get(2)?,
                    reps: row.get(3)?,
                    is_warmup: row.get(4)?,
                    is_pr: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let sets: Vec<ChartSet> = sets
            .into_iter()
            .filter(|s| sessions.iter().any(|x| x.id == s.session_id))
            .collect();
        let sessions = sessions
            .into_iter()
            .filter(|x| sets.iter().any(|s| s.session_id == x.id))
            .collect();

        Ok((sessions, sets))
    }
}

impl MaxSource for Database {
    fn fetch_maxes(&self, exercise_ids: &[String]) -> Result<HashMap<String, f64>> {
        self.historical_maxes(exercise_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::HistoricalMaxCache;
    use chrono::Duration;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn working(exercise: &str, number: u32, weight: f64, reps: u32, rpe: Option<f64>) -> Set {
        Set {
            exercise_id: exercise.to_string(),
            set_number: number,
            weight_kg: Some(weight),
            reps: Some(reps),
            rpe,
            is_warmup: false,
            is_completed: true,
            completed_at: None,
        }
    }

    /// Completed session with the given sets
    fn seed_session(db: &Database, started_at: DateTime<Utc>, day: Option<&str>, sets: &[Set]) -> i64 {
        let id = db.start_session(started_at, day).unwrap();
        for set in sets {
            db.add_set(id, set).unwrap();
        }
        db.complete_session(id, started_at + Duration::hours(1)).unwrap();
        id
    }

    #[test]
    fn test_recent_history_newest_first_working_sets_only() {
        let db = Database::open_in_memory().unwrap();
        let mut warmup = working("bench", 1, 40.0, 10, None);
        warmup.is_warmup = true;

        seed_session(&db, at(2, 18), None, &[working("bench", 1, 75.0, 8, Some(7.0))]);
        seed_session(
            &db,
            at(5, 18),
            None,
            &[warmup, working("bench", 2, 80.0, 8, Some(6.0)), working("bench", 3, 80.0, 7, None)],
        );
        seed_session(&db, at(9, 18), None, &[working("squat", 1, 120.0, 5, None)]);

        let history = db.recent_history("bench", HISTORY_SESSIONS).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].started_at, at(5, 18));
        assert_eq!(history[0].sets.len(), 2);
        assert_eq!(history[0].sets[0].weight_kg, Some(80.0));
        assert_eq!(history[1].started_at, at(2, 18));
    }

    #[test]
    fn test_recent_history_skips_open_session() {
        let db = Database::open_in_memory().unwrap();
        seed_session(&db, at(2, 18), None, &[working("bench", 1, 75.0, 8, None)]);
        let open = db.start_session(at(9, 18), None).unwrap();
        db.add_set(open, &working("bench", 1, 100.0, 8, None)).unwrap();

        let history = db.recent_history("bench", HISTORY_SESSIONS).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sets[0].weight_kg, Some(75.0));
    }

    #[test]
    fn test_historical_maxes_exclude_in_progress_and_warmups() {
        let db = Database::open_in_memory().unwrap();
        let mut heavy_warmup = working("bench", 1, 200.0, 1, None);
        heavy_warmup.is_warmup = true;
        seed_session(
            &db,
            at(2, 18),
            None,
            &[heavy_warmup, working("bench", 2, 100.0, 5, None), working("row", 1, 70.0, 8, None)],
        );
        let open = db.start_session(at(9, 18), None).unwrap();
        db.add_set(open, &working("bench", 1, 110.0, 5, None)).unwrap();

        let maxes = db
            .historical_maxes(&["bench".to_string(), "curl".to_string()])
            .unwrap();
        assert_eq!(maxes.get("bench"), Some(&100.0));
        assert_eq!(maxes.get("curl"), None);
        assert!(!maxes.contains_key("row"));
    }

    #[test]
    fn test_database_feeds_max_cache() {
        let db = Database::open_in_memory().unwrap();
        seed_session(&db, at(2, 18), None, &[working("bench", 1, 100.0, 5, None)]);

        let mut cache = HistoricalMaxCache::new();
        cache
            .load_missing(&db, &["bench".to_string(), "curl".to_string()])
            .unwrap();
        assert_eq!(cache.state("bench").value(), Some(100.0));
        assert_eq!(cache.state("curl").value(), Some(0.0));
    }

    #[test]
    fn test_active_exercises_grouping() {
        let db = Database::open_in_memory().unwrap();
        let id = db.start_session(at(9, 18), None).unwrap();
        db.add_set(id, &working("bench", 1, 100.0, 5, None)).unwrap();
        db.add_set(id, &working("row", 1, 70.0, 8, None)).unwrap();
        db.add_set(id, &working("bench", 2, 100.0, 5, None)).unwrap();

        let exercises = db.active_exercises(id).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].exercise_id, "bench");
        assert_eq!(exercises[0].sets.len(), 2);
        assert_eq!(db.next_set_number(id, "bench").unwrap(), 3);
    }

    #[test]
    fn test_mark_prs_flags_single_set() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_session(
            &db,
            at(2, 18),
            None,
            &[working("bench", 1, 140.0, 1, None), working("bench", 2, 140.0, 1, None)],
        );

        let key = PrKey {
            exercise_id: "bench".to_string(),
            weight_kg: 140.0,
        };
        assert_eq!(db.mark_prs(id, &[key]).unwrap(), 1);

        let (_, sets) = db.chart_rows("bench", None, &Utc).unwrap();
        assert_eq!(sets.iter().filter(|s| s.is_pr).count(), 1);
    }

    #[test]
    fn test_program_days_and_last_day() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_program_day("pull", "Pull", 1).unwrap();
        db.upsert_program_day("push", "Push", 0).unwrap();
        db.add_planned_exercise(
            "push",
            &PlannedExercise {
                exercise_id: "bench".to_string(),
                sets_target: 3,
                reps_target: Some(8),
                rest_seconds: None,
            },
        )
        .unwrap();

        let days = db.program_days().unwrap();
        assert_eq!(days[0].id, "push");
        assert_eq!(days[0].exercises.len(), 1);
        assert_eq!(db.planned_reps("push", "bench").unwrap(), Some(8));
        assert_eq!(db.planned_reps("pull", "bench").unwrap(), None);

        assert_eq!(db.last_completed_day().unwrap(), None);
        seed_session(&db, at(2, 18), Some("push"), &[]);
        seed_session(&db, at(4, 18), Some("pull"), &[]);
        assert_eq!(db.last_completed_day().unwrap(), Some("pull".to_string()));
        assert_eq!(db.day_sessions().unwrap().len(), 2);
    }

    #[test]
    fn test_chart_rows_scoped_by_date() {
        let db = Database::open_in_memory().unwrap();
        seed_session(&db, at(2, 18), None, &[working("bench", 1, 90.0, 5, None)]);
        seed_session(&db, at(9, 18), None, &[working("bench", 1, 95.0, 5, None)]);
        seed_session(&db, at(10, 18), None, &[working("squat", 1, 120.0, 5, None)]);

        let since = NaiveDate::from_ymd_opt(2026, 3, 5);
        let (sessions, sets) = db.chart_rows("bench", since, &Utc).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].weight_kg, Some(95.0));

        assert_eq!(db.chart_sessions(since, &Utc).unwrap().len(), 2);
    }

    #[test]
    fn test_session_exists_and_orphan_policy() {
        let db = Database::open_in_memory().unwrap();
        let id = db.start_session(at(9, 18), None).unwrap();

        assert_eq!(check_orphan(db.session_exists(id)), SessionCheck::Valid);
        assert_eq!(check_orphan(db.session_exists(id + 100)), SessionCheck::Orphaned);
        assert_eq!(
            check_orphan(Err(anyhow::anyhow!("connection reset"))),
            SessionCheck::AssumeValid
        );
    }

    #[test]
    fn test_exercise_catalog() {
        let db = Database::open_in_memory().unwrap();
        let exercise = Exercise {
            id: "squat".to_string(),
            name: "Back squat".to_string(),
            muscle_primary: "quads".to_string(),
        };
        db.upsert_exercise(&exercise).unwrap();
        assert_eq!(db.get_exercise("squat").unwrap(), Some(exercise));
        assert_eq!(db.get_exercise("nope").unwrap(), None);
    }

    #[test]
    fn test_finished_session_is_refused() {
        let db = Database::open_in_memory().unwrap();
        let open = db.start_session(at(9, 18), None).unwrap();
        let done = seed_session(&db, at(2, 18), None, &[working("bench", 1, 100.0, 5, None)]);

        assert!(db.is_session_open(open).unwrap());
        assert!(!db.is_session_open(done).unwrap());
        assert!(!db.is_session_open(open + 100).unwrap());

        assert!(db.ensure_open_session(open).is_ok());
        let err = db.ensure_open_session(done).unwrap_err();
        assert!(err.to_string().contains("already finished"));
        let err = db.ensure_open_session(open + 100).unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
    }

    #[test]
    fn test_history_orders_by_instant_not_text() {
        let db = Database::open_in_memory().unwrap();
        seed_session(&db, at(5, 12), None, &[working("bench", 1, 80.0, 8, None)]);

        // 2026-03-05T20:00+09:00 is 11:00 UTC, earlier than the session above
        // even though its text sorts later
        db.conn
            .execute(
                "INSERT INTO sessions (started_at, completed_at) VALUES (?1, ?1)",
                params!["2026-03-05T20:00:00+09:00"],
            )
            .unwrap();
        let id = db.conn.last_insert_rowid();
        db.add_set(id, &working("bench", 1, 75.0, 8, None)).unwrap();

        let history = db.recent_history("bench", HISTORY_SESSIONS).unwrap();
        assert_eq!(history[0].started_at, at(5, 12));
        assert_eq!(history[1].started_at, at(5, 11));
    }
}
