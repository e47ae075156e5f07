use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::models::{days_before, MriRecord, RiskLevel};

/// Fixed threshold lookup; each lower bound is inclusive.
pub fn band(mri: f64) -> RiskLevel {
    match mri {
        m if m >= 75.0 => RiskLevel::Low,
        m if m >= 50.0 => RiskLevel::Moderate,
        m if m >= 25.0 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

/// Threshold band, bumped one level for Moderate/High when the trailing
/// delta shows a steep decline.
pub fn classify(mri: f64, delta: Option<f64>, config: &EngineConfig) -> RiskLevel {
    let raw = band(mri);
    let steep = delta.is_some_and(|d| d <= config.decline_threshold);
    match raw {
        RiskLevel::Moderate | RiskLevel::High if steep => raw.escalate(),
        _ => raw,
    }
}

/// Change from the earliest record inside the decline span (which includes
/// `date` itself) to `mri`. `prior` must be sorted ascending.
pub fn trailing_delta<'a, I>(
    date: NaiveDate,
    mri: f64,
    prior: I,
    config: &EngineConfig,
) -> Option<f64>
where
    I: IntoIterator<Item = &'a MriRecord>,
{
    let span_start = days_before(date, i64::from(config.decline_span_days) - 1);
    prior
        .into_iter()
        .find(|record| record.date >= span_start && record.date < date)
        .map(|record| mri - record.mri_score)
}

pub fn coach_tip(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "You can push, but keep a 12-minute reset break every 2 hours.",
        RiskLevel::Moderate => {
            "Take a 17-minute low-stimulus break and avoid decision-heavy tasks after 6 PM today."
        }
        RiskLevel::High => {
            "Block 45 minutes for recovery, reduce workload intensity, and delay complex tasks."
        }
        RiskLevel::Critical => {
            "Stop adding work today. Hand off what you can and protect tonight's sleep."
        }
    }
}

pub fn recovery_now(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Hydration and light stretching recommended now.",
        RiskLevel::Moderate => "Step away from screens for 8 minutes and take 10 slow breaths.",
        RiskLevel::High => "Power nap suggestion: 18 minutes with a quiet timer.",
        RiskLevel::Critical => "Pause, breathe slowly for two minutes, then reassess.",
    }
}

/// Short headline shown above the forecast chart.
pub fn forecast_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Low Risk",
        RiskLevel::Moderate => "Elevated Risk",
        RiskLevel::High => "High Risk",
        RiskLevel::Critical => "Critical Risk",
    }
}

/// Headline confidence shown beside the forecast, in [0.70, 0.95].
pub fn headline_confidence(mri: f64) -> f64 {
    let confidence = (0.7 + (mri / 100.0) * 0.25).clamp(0.7, 0.95);
    (confidence * 100.0).round() / 100.0
}
