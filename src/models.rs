use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// `date` minus `days`, saturating at the earliest representable day.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|span| date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// `date` plus `days`, or `None` past the last representable day.
pub fn days_after(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|span| date.checked_add_signed(span))
}

/// The five self-reported wellness axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Sleep,
    Stress,
    Workload,
    Mood,
    Hydration,
}

impl Axis {
    /// Ordered by MRI weight, heaviest first. Deficiency ties resolve in this order.
    pub const ALL: [Axis; 5] = [
        Axis::Sleep,
        Axis::Stress,
        Axis::Workload,
        Axis::Mood,
        Axis::Hydration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Sleep => "sleep",
            Axis::Stress => "stress",
            Axis::Workload => "workload",
            Axis::Mood => "mood",
            Axis::Hydration => "hydration",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check-in as the caller hands it over: any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub mood: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub stress_level: Option<f64>,
    pub workload_hours: Option<f64>,
    pub water_liters: Option<f64>,
}

/// One stored, complete and clamped day of self-reported signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySignal {
    pub date: NaiveDate,
    pub mood: f64,
    pub sleep_hours: f64,
    pub stress_level: f64,
    pub workload_hours: f64,
    pub water_liters: f64,
}

impl DailySignal {
    pub fn value(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Sleep => self.sleep_hours,
            Axis::Stress => self.stress_level,
            Axis::Workload => self.workload_hours,
            Axis::Mood => self.mood,
            Axis::Hydration => self.water_liters,
        }
    }

    pub fn cognitive_load_intensity(&self) -> f64 {
        self.workload_hours * (1.0 + self.stress_level / 10.0)
    }
}

/// Per-axis wellness contribution in [0,1]; higher means more recovery capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedSignal {
    pub sleep: f64,
    pub stress: f64,
    pub workload: f64,
    pub mood: f64,
    pub hydration: f64,
}

impl NormalizedSignal {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Sleep => self.sleep,
            Axis::Stress => self.stress,
            Axis::Workload => self.workload,
            Axis::Mood => self.mood,
            Axis::Hydration => self.hydration,
        }
    }

    /// The lowest axis; ties go to the heavier-weighted axis.
    pub fn dominant_deficiency(&self) -> Axis {
        let mut lowest = Axis::ALL[0];
        for axis in Axis::ALL.iter().skip(1) {
            if self.get(*axis) < self.get(lowest) {
                lowest = *axis;
            }
        }
        lowest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn escalate(self) -> RiskLevel {
        match self {
            RiskLevel::Low => RiskLevel::Moderate,
            RiskLevel::Moderate => RiskLevel::High,
            RiskLevel::High | RiskLevel::Critical => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MriRecord {
    pub date: NaiveDate,
    pub mri_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub signal: DailySignal,
    pub record: MriRecord,
    pub cognitive_load_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CognitiveLoadPoint {
    pub date: NaiveDate,
    pub workload_hours: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_mri: f64,
    pub band: ConfidenceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub origin_date: NaiveDate,
    pub slope_per_day: f64,
    pub points: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Available(Forecast),
    Unavailable { history_days: usize, required: usize },
}

impl ForecastOutcome {
    pub fn forecast(&self) -> Option<&Forecast> {
        match self {
            ForecastOutcome::Available(forecast) => Some(forecast),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: String,
    pub title: String,
    pub target: Axis,
    pub estimated_minutes: u32,
    pub priority: u8,
    /// Offered only at this risk level or above.
    #[serde(default = "default_min_risk")]
    pub min_risk: RiskLevel,
}

fn default_min_risk() -> RiskLevel {
    RiskLevel::Low
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineDelta {
    /// False when the day already existed and was overwritten.
    pub inserted: bool,
    /// Every record rewritten by this check-in, oldest first.
    pub recomputed: Vec<MriRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckInResult {
    pub signal: DailySignal,
    pub mri_record: MriRecord,
    pub risk_level: RiskLevel,
    pub timeline_delta: TimelineDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub user_id: String,
    pub latest_mri: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub coach_tip: &'static str,
    pub recovery_now: &'static str,
    pub forecast_label: &'static str,
    pub dominant_deficiency: Axis,
    pub last_7_days: Vec<MriRecord>,
    pub cognitive_load: Vec<CognitiveLoadPoint>,
    pub forecast: ForecastOutcome,
    pub recommendations: Vec<Intervention>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_offsets_stay_inside_the_calendar() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            days_before(date, 1),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert_eq!(days_before(date, 200_000_000), NaiveDate::MIN);
        assert_eq!(days_before(NaiveDate::MIN, 7), NaiveDate::MIN);
        assert_eq!(days_after(date, 1), NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(days_after(NaiveDate::MAX, 1), None);
    }
}
