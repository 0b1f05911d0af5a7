//! Numeric primitives: e1RM, plate rounding, volume formatting, axis scaling

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Reps above this are clamped, Epley drifts badly past it
const MAX_RELIABLE_REPS: u32 = 15;

/// Smallest weight jump available with standard plates
pub const PLATE_INCREMENT: f64 = 2.5;

/// Volumes at or above this are shown in tonnes
const TONNE_THRESHOLD: f64 = 10_000.0;

const EPSILON: f64 = 1e-9;

/// Estimated one-rep max using Epley: `w × (1 + r/30)`.
///
/// Returns the weight itself for a single, and 0 for non-positive input.
pub fn estimate_max_1rm(weight_kg: f64, reps: u32) -> f64 {
    if weight_kg <= 0.0 || reps == 0 {
        return 0.0;
    }
    if reps == 1 {
        return weight_kg;
    }

    let r = reps.min(MAX_RELIABLE_REPS) as f64;
    (weight_kg * (1.0 + r / 30.0)).round()
}

/// Round to the nearest 2.5 kg
pub fn round_to_plate(weight_kg: f64) -> f64 {
    (weight_kg / PLATE_INCREMENT).round() * PLATE_INCREMENT
}

/// Number formatting rules for a locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub tag: String,
    pub group_separator: char,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            tag: "en-US".to_string(),
            group_separator: ',',
        }
    }
}

impl FromStr for Locale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() {
            return Err(ParseError::EmptyLocale);
        }

        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or(tag)
            .to_lowercase();

        let group_separator = match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "tr" | "id" | "da" => '.',
            "fr" => '\u{202F}',
            "ru" | "pl" | "uk" | "cs" | "sv" | "nb" | "fi" => '\u{00A0}',
            _ => ',',
        };

        Ok(Self {
            tag: tag.to_string(),
            group_separator,
        })
    }
}

impl Locale {
    /// Integer with thousands grouping
    pub fn group_integer(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if value < 0 {
            out.push('-');
        }
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(self.group_separator);
            }
            out.push(ch);
        }
        out
    }
}

/// Human readable training volume: `8,450 kg` or `12.3 t`
pub fn format_volume(kg: f64, locale: &Locale) -> String {
    if kg >= TONNE_THRESHOLD {
        // Half-up at the first decimal, matching what users see elsewhere
        let tenths = (kg / 100.0).round();
        format!("{:.1} t", tenths / 10.0)
    } else {
        format!("{} kg", locale.group_integer(kg.round() as i64))
    }
}

/// Y-axis layout for a chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub max_value: f64,
    pub step_value: f64,
    pub no_of_sections: u32,
}

const FALLBACK_SCALE: AxisScale = AxisScale {
    max_value: 100.0,
    step_value: 25.0,
    no_of_sections: 4,
};

const STEP_MULTIPLIERS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];
const MIN_SECTIONS: u32 = 3;
const MAX_SECTIONS: u32 = 5;
const LABEL_MULTIPLE: f64 = 5.0;

/// Pick a "nice" axis so every label is a multiple of 5 and there are 3 to 5 sections.
///
/// Candidate steps are `{1, 2, 2.5, 5, 10} × 10^k` around the magnitude of `data_max`,
/// tried smallest first.
pub fn nice_axis_scale(data_max: f64) -> AxisScale {
    if data_max <= 0.0 || !data_max.is_finite() {
        return FALLBACK_SCALE;
    }

    let exponent = data_max.log10().floor() as i32;

    for k in (exponent - 1)..=(exponent + 1) {
        let magnitude = 10f64.powi(k);
        for multiplier in STEP_MULTIPLIERS {
            let step = multiplier * magnitude;
            if !is_multiple_of(step, LABEL_MULTIPLE) {
                continue;
            }
            let sections = sections_for(data_max, step);
            if (MIN_SECTIONS..=MAX_SECTIONS).contains(&sections) {
                return AxisScale {
                    max_value: step * sections as f64,
                    step_value: step,
                    no_of_sections: sections,
                };
            }
        }
    }

    let sections = sections_for(data_max, LABEL_MULTIPLE).max(1);
    AxisScale {
        max_value: LABEL_MULTIPLE * sections as f64,
        step_value: LABEL_MULTIPLE,
        no_of_sections: sections,
    }
}

fn is_multiple_of(value: f64, base: f64) -> bool {
    let ratio = value / base;
    ratio >= 1.0 - EPSILON && (ratio - ratio.round()).abs() < EPSILON
}

fn sections_for(data_max: f64, step: f64) -> u32 {
    (data_max / step - EPSILON).ceil().max(0.0) as u32
}
