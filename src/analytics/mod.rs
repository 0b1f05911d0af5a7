//! Analytics module - workout analytics and progressive overload
//!
//! Features:
//! - Next working weight from the last two sessions
//! - Personal records, batch and realtime
//! - Session-over-session momentum
//! - Weekly streaks and program-day rotation
//! - Chart series with nice axis scaling
//!
//! Every function here is a pure transform over caller-supplied records.
//! Storage and clocks stay with the caller.

pub mod calendar;
pub mod charts;
pub mod momentum;
pub mod numeric;
pub mod overload;
pub mod records;
pub mod rotation;
pub mod streak;
pub mod types;

pub use calendar::{local_date, month_grid, shift_week, week_key, week_start};
pub use charts::{
    ChartKind, ChartRange, ChartSession, ChartSet, FrequencyPoint, StrengthPoint, VolumePoint,
    compute_frequency_points, compute_strength_points, compute_volume_points, pr_dates, range_days,
};
pub use momentum::calculate_momentum;
pub use numeric::{AxisScale, Locale, estimate_max_1rm, format_volume, nice_axis_scale, round_to_plate};
pub use overload::compute_overload_suggestion;
pub use records::{HistoricalMaxCache, MaxSource, MaxState, PrKey, best_pr_keys, detect_prs, pr_state};
pub use rotation::{DaySession, PlannedExercise, build_day_completions, estimate_duration, next_day_index};
pub use streak::{StreakMilestone, calculate_streak, milestone_for};
pub use types::{
    ActiveExercise, Direction, HistorySet, MomentumResult, OverloadSuggestion, PrState,
    SessionHistory, Set, StreakResult, SuggestionType,
};
