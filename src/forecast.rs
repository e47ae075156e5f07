use crate::config::EngineConfig;
use crate::models::{
    days_after, ConfidenceBand, Forecast, ForecastOutcome, ForecastPoint, MriRecord,
};
use crate::mri::round1;

/// Projects MRI forward from the trailing window of `records` (ascending).
///
/// The trend is an ordinary least-squares slope over calendar-day offsets,
/// so gaps in the history stretch the x axis instead of compressing it. The
/// band is heuristic: it grows with the horizon and shrinks with more samples.
/// A horizon running past the last representable date is unavailable.
pub fn forecast(records: &[MriRecord], config: &EngineConfig) -> ForecastOutcome {
    let start = records.len().saturating_sub(config.forecast_window);
    let window = &records[start..];

    let Some(last) = window.last() else {
        return unavailable(0, config);
    };
    if window.len() < config.forecast_min_history {
        return unavailable(window.len(), config);
    }

    let slope = trend_slope(window);
    let samples = window.len() as f64;
    let points: Option<Vec<ForecastPoint>> = (1..=config.forecast_horizon_days)
        .map(|days_ahead| {
            let ahead = f64::from(days_ahead);
            let predicted = round1((last.mri_score + slope * ahead).clamp(0.0, 100.0));
            let half_width = config.forecast_band_scale * ahead / samples;
            Some(ForecastPoint {
                date: days_after(last.date, i64::from(days_ahead))?,
                predicted_mri: predicted,
                band: ConfidenceBand {
                    lower: round1((predicted - half_width).clamp(0.0, 100.0)),
                    upper: round1((predicted + half_width).clamp(0.0, 100.0)),
                },
            })
        })
        .collect();
    let Some(points) = points else {
        return unavailable(window.len(), config);
    };

    ForecastOutcome::Available(Forecast {
        origin_date: last.date,
        slope_per_day: slope,
        points,
    })
}

fn unavailable(history_days: usize, config: &EngineConfig) -> ForecastOutcome {
    ForecastOutcome::Unavailable {
        history_days,
        required: config.forecast_min_history,
    }
}

/// Least-squares slope of MRI against days since the first record.
pub fn trend_slope(window: &[MriRecord]) -> f64 {
    let Some(first) = window.first() else {
        return 0.0;
    };
    let points: Vec<(f64, f64)> = window
        .iter()
        .map(|record| ((record.date - first.date).num_days() as f64, record.mri_score))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (numerator, denominator) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        (num + (x - mean_x) * (y - mean_y), den + (x - mean_x).powi(2))
    });

    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}
