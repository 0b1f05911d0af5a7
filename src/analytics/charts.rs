//! Chart series: strength, volume and frequency over time
//!
//! Raw session and set rows are folded per session, then bucketed per calendar
//! date, or per week (Monday key) for long ranges.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::week_start;
use super::numeric::estimate_max_1rm;
use crate::error::ParseError;

/// Requested time window of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    All,
}

impl ChartRange {
    /// Long ranges are plotted one point per week
    pub fn is_weekly(&self) -> bool {
        matches!(self, ChartRange::SixMonths | ChartRange::OneYear | ChartRange::All)
    }

    /// Inclusive first date of the range, None for everything
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            ChartRange::OneMonth => 1,
            ChartRange::ThreeMonths => 3,
            ChartRange::SixMonths => 6,
            ChartRange::OneYear => 12,
            ChartRange::All => return None,
        };
        today
            .checked_sub_months(Months::new(months))
            .or(Some(NaiveDate::MIN))
    }
}

impl FromStr for ChartRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(ChartRange::OneMonth),
            "3m" => Ok(ChartRange::ThreeMonths),
            "6m" => Ok(ChartRange::SixMonths),
            "1y" => Ok(ChartRange::OneYear),
            "all" => Ok(ChartRange::All),
            _ => Err(ParseError::UnknownRange(s.to_string())),
        }
    }
}

/// Which series a chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Strength,
    Volume,
    Frequency,
}

impl FromStr for ChartKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" | "1rm" => Ok(ChartKind::Strength),
            "volume" => Ok(ChartKind::Volume),
            "frequency" => Ok(ChartKind::Frequency),
            _ => Err(ParseError::UnknownChartKind(s.to_string())),
        }
    }
}

/// Session row as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSession {
    pub id: i64,
    /// Local calendar date of the session
    pub date: NaiveDate,
}

/// Set row as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSet {
    pub session_id: i64,
    pub exercise_id: String,
    pub weight_kg: Option<f64>,
    pub reps: Option<u32>,
    pub is_warmup: bool,
    pub is_pr: bool,
}

impl ChartSet {
    /// Weight and reps present, not a warmup
    fn valid(&self) -> Option<(f64, u32)> {
        if self.is_warmup {
            return None;
        }
        Some((self.weight_kg?, self.reps?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthPoint {
    pub date: NaiveDate,
    pub estimated_max_1rm: f64,
    pub best_set_weight: f64,
    pub best_set_reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub total_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    pub date: NaiveDate,
    pub count: u32,
}

fn bucket_key(date: NaiveDate, range: ChartRange) -> NaiveDate {
    if range.is_weekly() {
        week_start(date)
    } else {
        date
    }
}

fn session_dates(sessions: &[ChartSession]) -> HashMap<i64, NaiveDate> {
    sessions.iter().map(|s| (s.id, s.date)).collect()
}

/// Best estimated 1RM per session, then the best per bucket.
///
/// Unlike volume, weekly buckets keep the week's best instead of summing.
pub fn compute_strength_points(
    sessions: &[ChartSession],
    sets: &[ChartSet],
    range: ChartRange,
) -> Vec<StrengthPoint> {
    let dates = session_dates(sessions);
    let mut per_session: HashMap<i64, StrengthPoint> = HashMap::new();

    for set in sets {
        let Some(date) = dates.get(&set.session_id) else {
            continue;
        };
        let Some((weight, reps)) = set.valid() else {
            continue;
        };
        let candidate = StrengthPoint {
            date: *date,
            estimated_max_1rm: estimate_max_1rm(weight, reps),
            best_set_weight: weight,
            best_set_reps: reps,
        };
        per_session
            .entry(set.session_id)
            .and_modify(|best| {
                if candidate.estimated_max_1rm > best.estimated_max_1rm {
                    *best = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    // Earliest session wins ties
    let mut ordered: Vec<(i64, StrengthPoint)> = per_session.into_iter().collect();
    ordered.sort_by_key(|(id, p)| (p.date, *id));

    let mut buckets: BTreeMap<NaiveDate, StrengthPoint> = BTreeMap::new();
    for (_, point) in ordered {
        let key = bucket_key(point.date, range);
        let point = StrengthPoint { date: key, ..point };
        buckets
            .entry(key)
            .and_modify(|best| {
                if point.estimated_max_1rm > best.estimated_max_1rm {
                    *best = point.clone();
                }
            })
            .or_insert(point);
    }

    buckets.into_values().collect()
}

/// Σ weight × reps per session, summed per bucket
pub fn compute_volume_points(
    sessions: &[ChartSession],
    sets: &[ChartSet],
    range: ChartRange,
) -> Vec<VolumePoint> {
    let dates = session_dates(sessions);
    let mut per_session: HashMap<i64, f64> = HashMap::new();

    for set in sets {
        if !dates.contains_key(&set.session_id) {
            continue;
        }
        let Some((weight, reps)) = set.valid() else {
            continue;
        };
        *per_session.entry(set.session_id).or_insert(0.0) += weight * reps as f64;
    }

    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (session_id, volume) in per_session {
        let key = bucket_key(dates[&session_id], range);
        *buckets.entry(key).or_insert(0.0) += volume;
    }

    buckets
        .into_iter()
        .map(|(date, total_volume)| VolumePoint { date, total_volume })
        .collect()
}

/// Sessions per calendar date
pub fn compute_frequency_points(sessions: &[ChartSession]) -> Vec<FrequencyPoint> {
    let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for session in sessions {
        *counts.entry(session.date).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| FrequencyPoint { date, count })
        .collect()
}

/// Dates of the sessions in which a PR was set, for highlighting on charts
pub fn pr_dates(sessions: &[ChartSession], sets: &[ChartSet]) -> Vec<NaiveDate> {
    let dates = session_dates(sessions);
    let mut out: Vec<NaiveDate> = sets
        .iter()
        .filter(|s| s.is_pr && !s.is_warmup)
        .filter_map(|s| dates.get(&s.session_id).copied())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Days covered by a range ending today, for empty-state messages
pub fn range_days(range: ChartRange, today: NaiveDate) -> Option<i64> {
    range
        .start(today)
        .map(|start| (today - start).num_days() + 1)
}
