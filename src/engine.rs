use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::assistant;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::forecast;
use crate::models::{CheckInResult, Dashboard, DailySignal, ForecastOutcome, MriRecord, RawSignal};
use crate::normalize::{complete_signal, normalize, validate_raw};
use crate::recommend::Catalog;
use crate::risk;
use crate::timeline::Timeline;

const DASHBOARD_DAYS: u32 = 7;

/// Scoring, forecasting and recommendation over per-user timelines.
///
/// Not synchronised: callers must serialise writes for the same user.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    catalog: Catalog,
    timelines: HashMap<String, Timeline>,
}

impl Engine {
    pub fn new(config: EngineConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            timelines: HashMap::new(),
        }
    }

    /// Replaces the user's timeline with one rebuilt from stored signals.
    pub fn load_history(&mut self, user_id: &str, signals: Vec<DailySignal>) {
        let timeline = Timeline::from_signals(signals, &self.config);
        debug!(user_id, days = timeline.len(), "loaded history");
        self.timelines.insert(user_id.to_string(), timeline);
    }

    pub fn timeline(&self, user_id: &str) -> Option<&Timeline> {
        self.timelines.get(user_id)
    }

    pub fn submit_check_in(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        raw: &RawSignal,
    ) -> Result<CheckInResult, EngineError> {
        validate_raw(raw)?;

        let timeline = self.timelines.entry(user_id.to_string()).or_default();
        let signal = complete_signal(raw, date, timeline.signals(), &self.config)?;
        let timeline_delta = timeline.upsert(signal.clone(), &self.config);
        let mri_record = timeline
            .get(date)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| EngineError::not_found(user_id))?;

        info!(
            user_id,
            %date,
            mri = mri_record.mri_score,
            risk = %mri_record.risk_level,
            inserted = timeline_delta.inserted,
            recomputed = timeline_delta.recomputed.len(),
            "check-in scored"
        );

        Ok(CheckInResult {
            signal,
            risk_level: mri_record.risk_level,
            mri_record,
            timeline_delta,
        })
    }

    pub fn dashboard(&self, user_id: &str) -> Result<Dashboard, EngineError> {
        let timeline = self
            .timeline(user_id)
            .filter(|timeline| !timeline.is_empty())
            .ok_or_else(|| EngineError::not_found(user_id))?;
        let latest = timeline
            .latest()
            .ok_or_else(|| EngineError::not_found(user_id))?;

        let level = latest.record.risk_level;
        let normalized = normalize(&latest.signal, &self.config);
        let last_7_days: Vec<MriRecord> = timeline
            .last_days(DASHBOARD_DAYS)
            .iter()
            .map(|entry| entry.record.clone())
            .collect();

        Ok(Dashboard {
            user_id: user_id.to_string(),
            latest_mri: latest.record.mri_score,
            risk_level: level,
            confidence: risk::headline_confidence(latest.record.mri_score),
            coach_tip: risk::coach_tip(level),
            recovery_now: risk::recovery_now(level),
            forecast_label: risk::forecast_label(level),
            dominant_deficiency: normalized.dominant_deficiency(),
            last_7_days,
            cognitive_load: timeline.cognitive_load_series(DASHBOARD_DAYS),
            forecast: self.forecast(user_id),
            recommendations: self.catalog.recommend(level, &normalized),
        })
    }

    /// Unknown users simply have no history to project from.
    pub fn forecast(&self, user_id: &str) -> ForecastOutcome {
        let records: Vec<MriRecord> = self
            .timeline(user_id)
            .map(|timeline| {
                timeline
                    .last_n(self.config.forecast_window)
                    .iter()
                    .map(|entry| entry.record.clone())
                    .collect()
            })
            .unwrap_or_default();

        let outcome = forecast::forecast(&records, &self.config);
        match outcome.forecast() {
            Some(forecast) => debug!(user_id, slope = forecast.slope_per_day, "forecast projected"),
            None => debug!(user_id, history = records.len(), "forecast unavailable"),
        }
        outcome
    }

    pub fn chat(&self, user_id: Option<&str>, message: &str) -> Result<String, EngineError> {
        let risk = user_id
            .and_then(|id| self.timeline(id))
            .and_then(|timeline| timeline.latest())
            .map(|entry| entry.record.risk_level);
        assistant::reply(message, risk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::recommend::PAUSE_AND_BREATHE_ID;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn engine() -> Engine {
        Engine::new(EngineConfig::default(), Catalog::builtin())
    }

    fn raw(sleep: f64, stress: f64, workload: f64, mood: f64, water: f64) -> RawSignal {
        RawSignal {
            mood: Some(mood),
            sleep_hours: Some(sleep),
            stress_level: Some(stress),
            workload_hours: Some(workload),
            water_liters: Some(water),
        }
    }

    #[test]
    fn rested_first_day_lands_in_low_risk() {
        let mut engine = engine();
        let result = engine
            .submit_check_in("avery", day(1), &raw(8.0, 2.0, 4.0, 7.0, 2.0))
            .unwrap();
        assert!(result.mri_record.mri_score >= 75.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.timeline_delta.inserted);
    }

    #[test]
    fn depleted_first_day_is_critical_and_starts_with_pause() {
        let mut engine = engine();
        let result = engine
            .submit_check_in("jules", day(1), &raw(3.0, 9.0, 11.0, 2.0, 0.5))
            .unwrap();
        assert!(result.mri_record.mri_score < 25.0);
        assert_eq!(result.risk_level, RiskLevel::Critical);

        let dashboard = engine.dashboard("jules").unwrap();
        assert_eq!(dashboard.recommendations[0].id, PAUSE_AND_BREATHE_ID);
        assert!(dashboard.recommendations.len() <= 3);
    }

    #[test]
    fn identical_resubmission_gives_identical_record() {
        let mut engine = engine();
        engine
            .submit_check_in("kiara", day(1), &raw(7.0, 4.0, 8.0, 6.0, 1.5))
            .unwrap();
        let signal = raw(6.0, 5.0, 9.0, 5.0, 1.0);
        let first = engine.submit_check_in("kiara", day(2), &signal).unwrap();
        let second = engine.submit_check_in("kiara", day(2), &signal).unwrap();
        assert_eq!(first.mri_record, second.mri_record);
        assert!(!second.timeline_delta.inserted);
        assert_eq!(engine.timeline("kiara").unwrap().len(), 2);
    }

    #[test]
    fn steep_decline_escalates_risk() {
        let mut engine = engine();
        engine
            .submit_check_in("avery", day(1), &raw(8.0, 2.0, 4.0, 7.0, 2.0))
            .unwrap();
        engine
            .submit_check_in("avery", day(2), &raw(5.0, 6.0, 9.0, 4.0, 1.0))
            .unwrap();
        let third = engine
            .submit_check_in("avery", day(3), &raw(4.0, 7.0, 10.0, 3.0, 1.0))
            .unwrap();

        let score = third.mri_record.mri_score;
        assert!((25.0..50.0).contains(&score), "score {score}");
        assert_eq!(risk::band(score), RiskLevel::High);
        assert_eq!(third.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn dashboard_requires_history() {
        let engine = engine();
        assert_eq!(
            engine.dashboard("nobody").unwrap_err(),
            EngineError::not_found("nobody")
        );
    }

    #[test]
    fn malformed_input_does_not_create_a_user() {
        let mut engine = engine();
        let bad = RawSignal {
            sleep_hours: Some(f64::INFINITY),
            ..RawSignal::default()
        };
        assert!(engine.submit_check_in("avery", day(1), &bad).is_err());
        assert!(engine.timeline("avery").is_none());
    }

    #[test]
    fn forecast_needs_three_days() {
        let mut engine = engine();
        assert!(engine.forecast("avery").forecast().is_none());
        for d in 1..=2 {
            engine
                .submit_check_in("avery", day(d), &raw(7.0, 4.0, 8.0, 6.0, 1.5))
                .unwrap();
        }
        assert!(engine.forecast("avery").forecast().is_none());
        engine
            .submit_check_in("avery", day(3), &raw(7.0, 4.0, 8.0, 6.0, 1.5))
            .unwrap();
        assert_eq!(engine.forecast("avery").forecast().unwrap().points.len(), 7);
    }

    #[test]
    fn dashboard_collects_week_and_forecast() {
        let mut engine = engine();
        for d in 1..=10 {
            engine
                .submit_check_in("avery", day(d), &raw(7.0, 4.0, 8.0, 6.0, 1.5))
                .unwrap();
        }
        let dashboard = engine.dashboard("avery").unwrap();
        assert_eq!(dashboard.last_7_days.len(), 7);
        assert_eq!(dashboard.cognitive_load.len(), 7);
        assert_eq!(dashboard.last_7_days.last().unwrap().date, day(10));
        assert!(dashboard.forecast.forecast().is_some());
        assert!(!dashboard.recommendations.is_empty());
        assert!((0.7..=0.95).contains(&dashboard.confidence));
        assert_eq!(
            dashboard.forecast_label,
            risk::forecast_label(dashboard.risk_level)
        );
    }

    #[test]
    fn check_ins_at_the_calendar_edges_are_scored() {
        let mut engine = engine();
        let first = NaiveDate::MIN;
        for date in [first, first.succ_opt().unwrap()] {
            let result = engine
                .submit_check_in("avery", date, &raw(7.0, 4.0, 8.0, 6.0, 1.5))
                .unwrap();
            assert!((0.0..=100.0).contains(&result.mri_record.mri_score));
        }

        let last = NaiveDate::MAX;
        for back in (0..3).rev() {
            let date = last - chrono::Duration::days(back);
            engine
                .submit_check_in("jules", date, &raw(7.0, 4.0, 8.0, 6.0, 1.5))
                .unwrap();
        }
        assert!(engine.forecast("jules").forecast().is_none());
        let dashboard = engine.dashboard("jules").unwrap();
        assert_eq!(dashboard.last_7_days.len(), 3);
    }

    #[test]
    fn users_do_not_share_history() {
        let mut engine = engine();
        engine
            .submit_check_in("avery", day(1), &raw(8.0, 2.0, 4.0, 7.0, 2.0))
            .unwrap();
        engine
            .submit_check_in("jules", day(1), &RawSignal::default())
            .unwrap();
        assert_eq!(engine.timeline("avery").unwrap().len(), 1);
        assert_eq!(engine.timeline("jules").unwrap().len(), 1);
        let jules = &engine.timeline("jules").unwrap().entries()[0].signal;
        assert_eq!(jules.mood, EngineConfig::default().neutral_defaults.mood);
    }

    #[test]
    fn chat_uses_latest_risk() {
        let mut engine = engine();
        engine
            .submit_check_in("jules", day(1), &raw(3.0, 9.0, 11.0, 2.0, 0.5))
            .unwrap();
        let reply = engine.chat(Some("jules"), "so tired").unwrap();
        assert!(reply.contains("Critical"));
        assert!(engine.chat(None, "").is_err());
    }
}
