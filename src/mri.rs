use crate::config::{AxisWeights, EngineConfig};
use crate::models::{Axis, NormalizedSignal};

/// Weighted sum of one day's axis contributions, in [0,1].
pub fn same_day_component(signal: &NormalizedSignal, weights: &AxisWeights) -> f64 {
    Axis::ALL
        .iter()
        .map(|axis| weights.get(*axis) * signal.get(*axis).clamp(0.0, 1.0))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Exponentially weighted average over `values` (oldest first), where
/// `smoothing` is the weight carried over from the previous step.
pub fn ewma(values: &[f64], smoothing: f64) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    Some(
        rest.iter()
            .fold(*first, |acc, value| (1.0 - smoothing) * value + smoothing * acc),
    )
}

/// MRI in [0,100] rounded to one decimal. `trailing` holds the prior days,
/// oldest first; with no trailing days the same-day component stands alone.
pub fn compute_mri(
    current: &NormalizedSignal,
    trailing: &[NormalizedSignal],
    config: &EngineConfig,
) -> f64 {
    let today = same_day_component(current, &config.weights);
    let history: Vec<f64> = trailing
        .iter()
        .map(|signal| same_day_component(signal, &config.weights))
        .collect();

    let blended = match ewma(&history, config.smoothing_factor) {
        Some(past) => {
            (1.0 - config.smoothing_factor) * today + config.smoothing_factor * past
        }
        None => today,
    };

    round1(blended * 100.0).clamp(0.0, 100.0)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uniform(value: f64) -> NormalizedSignal {
        NormalizedSignal {
            sleep: value,
            stress: value,
            workload: value,
            mood: value,
            hydration: value,
        }
    }

    fn with_axis(mut signal: NormalizedSignal, axis: Axis, value: f64) -> NormalizedSignal {
        match axis {
            Axis::Sleep => signal.sleep = value,
            Axis::Stress => signal.stress = value,
            Axis::Workload => signal.workload = value,
            Axis::Mood => signal.mood = value,
            Axis::Hydration => signal.hydration = value,
        }
        signal
    }

    fn signal_strategy() -> impl Strategy<Value = NormalizedSignal> {
        (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(
            |(sleep, stress, workload, mood, hydration)| NormalizedSignal {
                sleep,
                stress,
                workload,
                mood,
                hydration,
            },
        )
    }

    #[test]
    fn first_record_uses_same_day_component_alone() {
        let config = EngineConfig::default();
        assert_eq!(compute_mri(&uniform(1.0), &[], &config), 100.0);
        assert_eq!(compute_mri(&uniform(0.0), &[], &config), 0.0);
        assert_eq!(compute_mri(&uniform(0.5), &[], &config), 50.0);
    }

    #[test]
    fn weights_apply_per_axis() {
        let config = EngineConfig::default();
        let only_sleep = NormalizedSignal {
            sleep: 1.0,
            ..uniform(0.0)
        };
        assert_eq!(compute_mri(&only_sleep, &[], &config), 30.0);
    }

    #[test]
    fn trailing_window_dampens_a_single_bad_day() {
        let config = EngineConfig::default();
        let history = vec![uniform(0.9); 5];
        let dampened = compute_mri(&uniform(0.2), &history, &config);
        let alone = compute_mri(&uniform(0.2), &[], &config);
        assert!(dampened > alone);
        assert_eq!(dampened, 41.0);
    }

    #[test]
    fn ewma_favours_recent_values() {
        let rising = ewma(&[0.0, 0.0, 1.0], 0.3).unwrap();
        let falling = ewma(&[1.0, 0.0, 0.0], 0.3).unwrap();
        assert!(rising > falling);
        assert!(ewma(&[], 0.3).is_none());
    }

    #[test]
    fn rounds_to_one_decimal() {
        let config = EngineConfig::default();
        let mri = compute_mri(&uniform(0.12345), &[], &config);
        assert_eq!(mri, 12.3);
    }

    proptest! {
        #[test]
        fn mri_stays_in_range(
            current in signal_strategy(),
            trailing in prop::collection::vec(signal_strategy(), 0..8),
        ) {
            let mri = compute_mri(&current, &trailing, &EngineConfig::default());
            prop_assert!((0.0..=100.0).contains(&mri));
        }

        #[test]
        fn mri_is_monotonic_in_each_axis(
            current in signal_strategy(),
            trailing in prop::collection::vec(signal_strategy(), 0..8),
            axis_index in 0usize..5,
            bump in 0.0..=1.0f64,
        ) {
            let config = EngineConfig::default();
            let axis = Axis::ALL[axis_index];
            let improved = with_axis(current, axis, (current.get(axis) + bump).min(1.0));
            let before = compute_mri(&current, &trailing, &config);
            let after = compute_mri(&improved, &trailing, &config);
            prop_assert!(after >= before);
        }
    }
}
