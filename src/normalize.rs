use chrono::NaiveDate;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{days_before, Axis, DailySignal, NormalizedSignal, RawSignal};

/// Valid raw range per axis. Out-of-range input is clamped into it.
pub fn raw_range(axis: Axis) -> (f64, f64) {
    match axis {
        Axis::Mood | Axis::Stress => (0.0, 10.0),
        Axis::Sleep | Axis::Workload => (0.0, 24.0),
        Axis::Hydration => (0.0, 10.0),
    }
}

fn json_keys(axis: Axis) -> &'static [&'static str] {
    match axis {
        Axis::Mood => &["mood"],
        Axis::Sleep => &["sleep_hours", "sleep"],
        Axis::Stress => &["stress_level", "stress"],
        Axis::Workload => &["workload_hours", "workload"],
        Axis::Hydration => &["water_liters", "water", "water_intake_liters"],
    }
}

fn raw_value(raw: &RawSignal, axis: Axis) -> Option<f64> {
    match axis {
        Axis::Sleep => raw.sleep_hours,
        Axis::Stress => raw.stress_level,
        Axis::Workload => raw.workload_hours,
        Axis::Mood => raw.mood,
        Axis::Hydration => raw.water_liters,
    }
}

fn set_raw_value(raw: &mut RawSignal, axis: Axis, value: Option<f64>) {
    match axis {
        Axis::Sleep => raw.sleep_hours = value,
        Axis::Stress => raw.stress_level = value,
        Axis::Workload => raw.workload_hours = value,
        Axis::Mood => raw.mood = value,
        Axis::Hydration => raw.water_liters = value,
    }
}

/// Parses a loosely-typed check-in body. Numbers and numeric strings are
/// accepted; `null` or an absent key means "missing".
pub fn raw_from_json(value: &Value) -> Result<RawSignal, EngineError> {
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::validation("signal", "expected a JSON object"))?;

    let mut raw = RawSignal::default();
    for axis in Axis::ALL {
        let found = json_keys(axis)
            .iter()
            .find_map(|key| object.get(*key).map(|v| (*key, v)));
        let parsed = match found {
            None | Some((_, Value::Null)) => None,
            Some((key, Value::Number(number))) => Some(
                number
                    .as_f64()
                    .ok_or_else(|| EngineError::validation(key, "not representable as f64"))?,
            ),
            Some((key, Value::String(text))) => Some(
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| EngineError::validation(key, format!("'{text}' is not numeric")))?,
            ),
            Some((key, _)) => return Err(EngineError::validation(key, "expected a number")),
        };
        set_raw_value(&mut raw, axis, parsed);
    }

    validate_raw(&raw)?;
    Ok(raw)
}

/// Rejects NaN and infinities; everything else numeric is clamped later.
pub fn validate_raw(raw: &RawSignal) -> Result<(), EngineError> {
    for axis in Axis::ALL {
        if let Some(value) = raw_value(raw, axis) {
            if !value.is_finite() {
                return Err(EngineError::validation(axis.as_str(), "must be a finite number"));
            }
        }
    }
    Ok(())
}

/// Builds the stored signal for `date`: present fields are clamped, missing
/// fields take the trailing average of `history` or the neutral default.
pub fn complete_signal<'a, I>(
    raw: &RawSignal,
    date: NaiveDate,
    history: I,
    config: &EngineConfig,
) -> Result<DailySignal, EngineError>
where
    I: IntoIterator<Item = &'a DailySignal>,
{
    validate_raw(raw)?;

    let window_start = days_before(date, i64::from(config.imputation_window_days));
    let trailing: Vec<&DailySignal> = history
        .into_iter()
        .filter(|signal| signal.date >= window_start && signal.date < date)
        .collect();

    let resolve = |axis: Axis| -> f64 {
        let (low, high) = raw_range(axis);
        match raw_value(raw, axis) {
            Some(value) => value.clamp(low, high),
            None if trailing.is_empty() => config.neutral_defaults.get(axis).clamp(low, high),
            None => {
                let total: f64 = trailing.iter().map(|signal| signal.value(axis)).sum();
                (total / trailing.len() as f64).clamp(low, high)
            }
        }
    };

    Ok(DailySignal {
        date,
        mood: resolve(Axis::Mood),
        sleep_hours: resolve(Axis::Sleep),
        stress_level: resolve(Axis::Stress),
        workload_hours: resolve(Axis::Workload),
        water_liters: resolve(Axis::Hydration),
    })
}

pub fn normalize(signal: &DailySignal, config: &EngineConfig) -> NormalizedSignal {
    NormalizedSignal {
        sleep: sleep_score(signal.sleep_hours, config.sleep_ceiling_hours),
        stress: 1.0 - (signal.stress_level / 10.0).clamp(0.0, 1.0),
        workload: 1.0 - (signal.workload_hours / config.workload_ceiling_hours).clamp(0.0, 1.0),
        mood: (signal.mood / 10.0).clamp(0.0, 1.0),
        hydration: (signal.water_liters / config.hydration_target_liters).clamp(0.0, 1.0),
    }
}

/// Rises linearly to 1.0 at the ceiling, then eases back toward 0.5 at 24h.
fn sleep_score(hours: f64, ceiling: f64) -> f64 {
    let (_, max_hours) = raw_range(Axis::Sleep);
    let hours = hours.clamp(0.0, max_hours);
    if hours <= ceiling {
        return hours / ceiling;
    }
    let excess_span = (max_hours - ceiling).max(f64::EPSILON);
    1.0 - 0.5 * ((hours - ceiling) / excess_span).clamp(0.0, 1.0)
}
