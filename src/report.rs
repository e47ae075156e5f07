use std::fmt::Write;

use crate::models::{Dashboard, ForecastOutcome};

pub fn build_report(display_name: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Mental Recovery Report");
    let _ = writeln!(
        output,
        "Generated for {} ({})",
        display_name, dashboard.user_id
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "**MRI {:.1}** · {} risk · confidence {:.2}",
        dashboard.latest_mri, dashboard.risk_level, dashboard.confidence
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "- Outlook: {}", dashboard.forecast_label);
    let _ = writeln!(output, "- Coach tip: {}", dashboard.coach_tip);
    let _ = writeln!(output, "- Recover now: {}", dashboard.recovery_now);
    let _ = writeln!(
        output,
        "- Weakest signal: {}",
        dashboard.dominant_deficiency
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last 7 Days");

    if dashboard.last_7_days.is_empty() {
        let _ = writeln!(output, "No check-ins recorded for this window.");
    } else {
        let _ = writeln!(output, "| Day | MRI | Risk | Workload h | Load intensity |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for (record, load) in dashboard.last_7_days.iter().zip(&dashboard.cognitive_load) {
            let _ = writeln!(
                output,
                "| {} | {:.1} | {} | {:.1} | {:.1} |",
                record.date, record.mri_score, record.risk_level, load.workload_hours, load.intensity
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 7-Day Forecast");

    match &dashboard.forecast {
        ForecastOutcome::Available(forecast) => {
            let _ = writeln!(
                output,
                "Trend {:+.2} points/day from {}.",
                forecast.slope_per_day, forecast.origin_date
            );
            for point in forecast.points.iter() {
                let _ = writeln!(
                    output,
                    "- {}: {:.1} (range {:.1} to {:.1})",
                    point.date, point.predicted_mri, point.band.lower, point.band.upper
                );
            }
        }
        ForecastOutcome::Unavailable {
            history_days,
            required,
        } => {
            let _ = writeln!(
                output,
                "Forecast unavailable: {} of {} required days recorded.",
                history_days, required
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recovery Plan");

    for (rank, intervention) in dashboard.recommendations.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({} min, targets {})",
            rank + 1,
            intervention.title,
            intervention.estimated_minutes,
            intervention.target
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::models::RawSignal;
    use crate::recommend::Catalog;
    use chrono::NaiveDate;

    fn check_in(engine: &mut Engine, d: u32) {
        let raw = RawSignal {
            mood: Some(6.0),
            sleep_hours: Some(7.0),
            stress_level: Some(4.0),
            workload_hours: Some(8.0),
            water_liters: Some(1.5),
        };
        let date = NaiveDate::from_ymd_opt(2026, 8, d).unwrap();
        engine.submit_check_in("avery@example.com", date, &raw).unwrap();
    }

    #[test]
    fn report_lists_forecast_and_plan() {
        let mut engine = Engine::new(EngineConfig::default(), Catalog::builtin());
        for d in 1..=4 {
            check_in(&mut engine, d);
        }
        let dashboard = engine.dashboard("avery@example.com").unwrap();
        let report = build_report("Avery Lee", &dashboard);

        assert!(report.starts_with("# Mental Recovery Report"));
        assert!(report.contains("Generated for Avery Lee (avery@example.com)"));
        assert!(report.contains(&format!("- Outlook: {}", dashboard.forecast_label)));
        assert!(report.contains("| 2026-08-04 |"));
        assert!(report.contains("Trend "));
        assert_eq!(report.matches("\n- 2026-08-").count(), 7);
        assert!(report.contains("## Recovery Plan\n1. "));
    }

    #[test]
    fn report_explains_missing_forecast() {
        let mut engine = Engine::new(EngineConfig::default(), Catalog::builtin());
        check_in(&mut engine, 1);
        let dashboard = engine.dashboard("avery@example.com").unwrap();
        let report = build_report("Avery Lee", &dashboard);
        assert!(report.contains("Forecast unavailable: 1 of 3 required days recorded."));
    }
}
