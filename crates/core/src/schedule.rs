//! Time-point schedules for repeated timed records.
//!
//! A `times` block on an observation turns one action into `qty` records. The block is
//! classified once into a [`Schedule`]; each variant then derives its day offsets from "now".

use crate::definitions::TimingSpec;
use crate::{KindlingError, KindlingResult};
use chrono::{DateTime, Duration, Utc};
use kindling_random::SeededRandom;
use std::fmt::Display;

/// Default window, in days, for records with no timing of their own.
const DEFAULT_RECENT_DAYS: (i64, i64) = (1, 30);

#[derive(Clone, Debug, PartialEq)]
pub enum Schedule {
    /// Each record lands uniformly 1 to 30 days ago.
    Default { qty: u32 },
    /// Fixed offsets starting at `days_ago`, `spacing` days apart.
    Anchored {
        qty: u32,
        days_ago: i64,
        spacing_days: Option<i64>,
    },
    /// Spread evenly across the last `months` (one random draw when `qty` is 1).
    LookbackMonths { qty: u32, months: f64 },
    /// Independent uniform draws within the last `days`, oldest first.
    LookbackDays { qty: u32, days: i64 },
}

impl Schedule {
    /// Classify a timing block. `days_ago` wins over `lookback_months`, which wins over
    /// `lookback_days`.
    pub fn from_spec(spec: Option<&TimingSpec>) -> Self {
        let Some(spec) = spec else {
            return Schedule::Default { qty: 1 };
        };
        let qty = spec.qty.unwrap_or(1).max(1);

        if let Some(days_ago) = spec.days_ago {
            Schedule::Anchored {
                qty,
                days_ago,
                spacing_days: spec.spacing_days,
            }
        } else if let Some(months) = spec.lookback_months {
            Schedule::LookbackMonths { qty, months }
        } else if let Some(days) = spec.lookback_days {
            Schedule::LookbackDays { qty, days }
        } else {
            Schedule::Default { qty }
        }
    }

    /// Day offsets back from now, one per record.
    pub fn offsets(&self, rng: &mut SeededRandom) -> KindlingResult<Vec<i64>> {
        let offsets: Vec<i64> = match *self {
            Schedule::Default { qty } => (0..qty)
                .map(|_| rng.int_range(DEFAULT_RECENT_DAYS.0, DEFAULT_RECENT_DAYS.1))
                .collect(),
            Schedule::Anchored {
                qty,
                days_ago,
                spacing_days,
            } => {
                if qty == 1 {
                    return Ok(vec![days_ago]);
                }
                let derived = (days_ago.div_euclid(i64::from(qty - 1))).max(1);
                let spacing = spacing_days.unwrap_or(derived);
                (0..i64::from(qty))
                    .map(|i| {
                        i.checked_mul(spacing)
                            .and_then(|shift| days_ago.checked_add(shift))
                            .ok_or_else(|| {
                                let value = format!("{days_ago} + {i} * {spacing}");
                                out_of_range("times.spacing_days", value)
                            })
                    })
                    .collect::<KindlingResult<_>>()?
            }
            Schedule::LookbackMonths { qty, months } => {
                let total_days = (months * 30.0) as i64;
                if qty == 1 {
                    return Ok(vec![rng.int_range(0, total_days.max(1))]);
                }
                let step = total_days as f64 / f64::from(qty - 1);
                (0..qty)
                    .map(|i| (f64::from(i) * step).round_ties_even() as i64)
                    .collect()
            }
            Schedule::LookbackDays { qty, days } => {
                let mut offsets: Vec<i64> =
                    (0..qty).map(|_| rng.int_range(0, days.max(1))).collect();
                offsets.sort_unstable();
                offsets
            }
        };
        Ok(offsets)
    }

    /// Timestamps for each record, measured back from `now`.
    pub fn time_points(
        &self,
        rng: &mut SeededRandom,
        now: DateTime<Utc>,
    ) -> KindlingResult<Vec<DateTime<Utc>>> {
        self.offsets(rng)?
            .into_iter()
            .map(|days| days_before(now, days, "times"))
            .collect()
    }
}

/// `days` before `at`; `field` names the offending setting when the result leaves the
/// representable date range.
pub fn days_before(at: DateTime<Utc>, days: i64, field: &str) -> KindlingResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| at.checked_sub_signed(delta))
        .ok_or_else(|| out_of_range(field, days))
}

pub fn days_after(at: DateTime<Utc>, days: i64, field: &str) -> KindlingResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(field, days))
}

pub(crate) fn out_of_range(field: &str, value: impl Display) -> KindlingError {
    KindlingError::Configuration(format!("{field} = {value} is outside the supported date range"))
}
