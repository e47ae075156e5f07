use std::path::Path;

use anyhow::Context;

use crate::error::EngineError;
use crate::models::{Axis, Intervention, NormalizedSignal, RiskLevel};

pub const PAUSE_AND_BREATHE_ID: &str = "pause-and-breathe";

/// Key of the recommendation rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub risk: RiskLevel,
    pub axis: Axis,
}

impl RuleKey {
    pub fn for_signal(risk: RiskLevel, signal: &NormalizedSignal) -> Self {
        Self {
            risk,
            axis: signal.dominant_deficiency(),
        }
    }

    /// How many targeted suggestions this risk level gets. Critical also
    /// receives the pause entry ahead of these.
    pub fn slots(&self) -> usize {
        match self.risk {
            RiskLevel::Low => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 2,
        }
    }
}

/// The static intervention catalog, loaded once at start.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Intervention>,
    pause: Intervention,
}

impl Catalog {
    pub fn new(entries: Vec<Intervention>) -> Result<Self, EngineError> {
        let (pauses, entries): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.id == PAUSE_AND_BREATHE_ID);

        for axis in Axis::ALL {
            let has_fallback = entries
                .iter()
                .any(|entry| entry.target == axis && entry.min_risk == RiskLevel::Low);
            if !has_fallback {
                return Err(EngineError::validation(
                    "catalog",
                    format!("no fallback intervention for {axis}"),
                ));
            }
        }

        Ok(Self {
            entries,
            pause: pauses.into_iter().next().unwrap_or_else(pause_and_breathe),
        })
    }

    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
            pause: pause_and_breathe(),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let entries: Vec<Intervention> = serde_json::from_str(&text)
            .with_context(|| format!("invalid catalog JSON in {}", path.display()))?;
        Ok(Self::new(entries)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries eligible under `key`, best first: priority descending, then
    /// quickest first.
    pub fn candidates(&self, key: RuleKey) -> Vec<&Intervention> {
        let mut matches: Vec<&Intervention> = self
            .entries
            .iter()
            .filter(|entry| entry.target == key.axis && entry.min_risk <= key.risk)
            .collect();
        matches.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.estimated_minutes.cmp(&b.estimated_minutes))
                .then_with(|| a.id.cmp(&b.id))
        });
        matches
    }

    /// One to three interventions for today.
    pub fn recommend(&self, risk: RiskLevel, signal: &NormalizedSignal) -> Vec<Intervention> {
        let key = RuleKey::for_signal(risk, signal);
        let mut picks = Vec::with_capacity(3);
        if risk == RiskLevel::Critical {
            picks.push(self.pause.clone());
        }
        picks.extend(
            self.candidates(key)
                .into_iter()
                .take(key.slots())
                .cloned(),
        );
        picks
    }
}

fn pause_and_breathe() -> Intervention {
    Intervention {
        id: PAUSE_AND_BREATHE_ID.to_string(),
        title: "Pause and breathe: 60 seconds of box breathing (4-4-4-4)".to_string(),
        target: Axis::Stress,
        estimated_minutes: 2,
        priority: u8::MAX,
        min_risk: RiskLevel::Critical,
    }
}

fn entry(
    id: &str,
    title: &str,
    target: Axis,
    estimated_minutes: u32,
    priority: u8,
    min_risk: RiskLevel,
) -> Intervention {
    Intervention {
        id: id.to_string(),
        title: title.to_string(),
        target,
        estimated_minutes,
        priority,
        min_risk,
    }
}

fn builtin_entries() -> Vec<Intervention> {
    use Axis::*;
    use RiskLevel::*;

    vec![
        entry("sleep-wind-down", "Dim screens 60 minutes before bed tonight", Sleep, 60, 5, Low),
        entry("sleep-slow-breath", "Three-minute slow-breath routine before sleep", Sleep, 3, 5, Low),
        entry("sleep-power-nap", "Power nap: 18 minutes with a quiet timer", Sleep, 18, 7, Moderate),
        entry("sleep-early-cutoff", "Stop work two hours earlier and go to bed on time", Sleep, 120, 8, High),
        entry("stress-box-breathing", "Box breathing for two minutes", Stress, 2, 6, Low),
        entry("stress-screen-break", "Step away from screens for 8 minutes", Stress, 8, 6, Low),
        entry("stress-low-stimulus", "17-minute low-stimulus break", Stress, 17, 8, Moderate),
        entry("stress-talk-it-out", "Call someone you trust for ten minutes", Stress, 10, 9, High),
        entry("workload-single-task", "Pick the one most urgent task and close other tabs", Workload, 5, 5, Low),
        entry("workload-reset-break", "12-minute reset break every 2 hours", Workload, 12, 6, Low),
        entry("workload-defer", "Delay decision-heavy tasks until tomorrow", Workload, 10, 8, Moderate),
        entry("workload-recovery-block", "Block 45 minutes for recovery in your calendar", Workload, 45, 9, High),
        entry("mood-walk", "Ten-minute walk outside", Mood, 10, 5, Low),
        entry("mood-gratitude", "Write down three things that went well", Mood, 5, 5, Low),
        entry("mood-focus-sprint", "One 25-minute focus sprint on a small, finishable task", Mood, 25, 7, Moderate),
        entry("mood-reach-out", "Message a friend and plan something for this week", Mood, 5, 8, High),
        entry("hydration-glass", "Drink a glass of water now", Hydration, 1, 5, Low),
        entry("hydration-bottle", "Keep a filled bottle on your desk and finish it by lunch", Hydration, 2, 6, Low),
        entry("hydration-stretch", "Refill your water and do light stretching", Hydration, 5, 7, Moderate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_low_in(axis: Axis) -> NormalizedSignal {
        let low = |a: Axis| if a == axis { 0.2 } else { 0.8 };
        NormalizedSignal {
            sleep: low(Axis::Sleep),
            stress: low(Axis::Stress),
            workload: low(Axis::Workload),
            mood: low(Axis::Mood),
            hydration: low(Axis::Hydration),
        }
    }

    #[test]
    fn builtin_catalog_has_fallback_for_every_axis() {
        assert!(Catalog::new(builtin_entries()).is_ok());
    }

    #[test]
    fn catalog_without_fallback_is_rejected() {
        let entries: Vec<Intervention> = builtin_entries()
            .into_iter()
            .filter(|e| e.target != Axis::Hydration || e.min_risk != RiskLevel::Low)
            .collect();
        assert!(matches!(
            Catalog::new(entries),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn recommendations_target_dominant_deficiency() {
        let catalog = Catalog::builtin();
        for axis in Axis::ALL {
            for risk in [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High] {
                let picks = catalog.recommend(risk, &signal_low_in(axis));
                assert!(!picks.is_empty() && picks.len() <= 3);
                assert!(picks.iter().all(|p| p.target == axis));
            }
        }
    }

    #[test]
    fn ordering_prefers_priority_then_quick_wins() {
        let catalog = Catalog::builtin();
        let picks = catalog.recommend(RiskLevel::Moderate, &signal_low_in(Axis::Stress));
        let ids: Vec<&str> = picks.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["stress-low-stimulus", "stress-box-breathing"]);
    }

    #[test]
    fn higher_risk_unlocks_stronger_entries() {
        let catalog = Catalog::builtin();
        let low = catalog.recommend(RiskLevel::Low, &signal_low_in(Axis::Workload));
        let high = catalog.recommend(RiskLevel::High, &signal_low_in(Axis::Workload));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "workload-reset-break");
        assert_eq!(high[0].id, "workload-recovery-block");
        assert_eq!(high.len(), 3);
    }

    #[test]
    fn critical_always_starts_with_pause_and_breathe() {
        let catalog = Catalog::builtin();
        for axis in Axis::ALL {
            let picks = catalog.recommend(RiskLevel::Critical, &signal_low_in(axis));
            assert_eq!(picks[0].id, PAUSE_AND_BREATHE_ID);
            assert!(picks.len() <= 3);
            assert!(picks[1..].iter().all(|p| p.target == axis));
        }
    }

    #[test]
    fn deficiency_ties_go_to_heavier_axis() {
        let signal = NormalizedSignal {
            sleep: 0.4,
            stress: 0.9,
            workload: 0.9,
            mood: 0.4,
            hydration: 0.4,
        };
        assert_eq!(signal.dominant_deficiency(), Axis::Sleep);
        assert_eq!(RuleKey::for_signal(RiskLevel::Low, &signal).axis, Axis::Sleep);
    }

    #[test]
    fn catalog_parses_from_json() {
        let entries: Vec<Intervention> = serde_json::from_str(
            r#"[{"id":"x","title":"Walk","target":"mood","estimated_minutes":10,"priority":3}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].min_risk, RiskLevel::Low);
        assert_eq!(entries[0].target, Axis::Mood);
    }
}
