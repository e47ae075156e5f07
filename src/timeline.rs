use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::models::{
    days_before, CognitiveLoadPoint, DailySignal, MriRecord, NormalizedSignal, TimelineDelta,
    TimelineEntry,
};
use crate::mri::compute_mri;
use crate::normalize::normalize;
use crate::risk;

/// One user's history: strictly ascending by date, one entry per day.
///
/// Records are only ever written by recomputation. Changing a day rewrites
/// that day and every later one; earlier days are never touched.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a timeline from stored signals in any order. A later
    /// duplicate of a day replaces the earlier one.
    pub fn from_signals(signals: Vec<DailySignal>, config: &EngineConfig) -> Self {
        let mut timeline = Timeline::new();
        for signal in signals {
            match timeline.position(signal.date) {
                Ok(index) => timeline.entries[index].signal = signal,
                Err(index) => timeline.entries.insert(index, placeholder(signal)),
            }
        }
        timeline.recompute_from_index(0, config);
        timeline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&TimelineEntry> {
        self.position(date).ok().map(|index| &self.entries[index])
    }

    pub fn signals(&self) -> impl Iterator<Item = &DailySignal> {
        self.entries().iter().map(|entry| &entry.signal)
    }

    /// Inserts or overwrites the day, then recomputes from it forward.
    pub fn upsert(&mut self, signal: DailySignal, config: &EngineConfig) -> TimelineDelta {
        let date = signal.date;
        let inserted = match self.position(date) {
            Ok(index) => {
                self.entries[index].signal = signal;
                false
            }
            Err(index) => {
                self.entries.insert(index, placeholder(signal));
                true
            }
        };

        TimelineDelta {
            inserted,
            recomputed: self.recompute_from(date, config),
        }
    }

    /// Recomputes every record on or after `date` and returns them.
    pub fn recompute_from(&mut self, date: NaiveDate, config: &EngineConfig) -> Vec<MriRecord> {
        let index = self.entries.partition_point(|entry| entry.signal.date < date);
        self.recompute_from_index(index, config)
    }

    /// The last `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> &[TimelineEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Entries dated within the `days` calendar days ending at the latest entry.
    pub fn last_days(&self, days: u32) -> &[TimelineEntry] {
        let Some(latest) = self.latest() else {
            return &[];
        };
        let cutoff = days_before(latest.signal.date, i64::from(days.max(1)) - 1);
        let start = self.entries.partition_point(|entry| entry.signal.date < cutoff);
        &self.entries[start..]
    }

    pub fn cognitive_load_series(&self, days: u32) -> Vec<CognitiveLoadPoint> {
        self.last_days(days)
            .iter()
            .map(|entry| CognitiveLoadPoint {
                date: entry.signal.date,
                workload_hours: entry.signal.workload_hours,
                intensity: entry.cognitive_load_intensity,
            })
            .collect()
    }

    fn position(&self, date: NaiveDate) -> Result<usize, usize> {
        self.entries
            .binary_search_by_key(&date, |entry| entry.signal.date)
    }

    fn recompute_from_index(&mut self, index: usize, config: &EngineConfig) -> Vec<MriRecord> {
        let mut recomputed = Vec::with_capacity(self.entries.len().saturating_sub(index));
        for current in index..self.entries.len() {
            let (prior, rest) = self.entries.split_at_mut(current);
            let entry = &mut rest[0];
            entry.record = evaluate(&entry.signal, prior, config);
            entry.cognitive_load_intensity = entry.signal.cognitive_load_intensity();
            recomputed.push(entry.record.clone());
        }
        recomputed
    }
}

fn placeholder(signal: DailySignal) -> TimelineEntry {
    let record = MriRecord {
        date: signal.date,
        mri_score: 0.0,
        risk_level: risk::band(0.0),
    };
    TimelineEntry {
        cognitive_load_intensity: signal.cognitive_load_intensity(),
        signal,
        record,
    }
}

/// Scores one day against the already-final entries before it.
fn evaluate(signal: &DailySignal, prior: &[TimelineEntry], config: &EngineConfig) -> MriRecord {
    let window_start = days_before(signal.date, i64::from(config.trailing_window_days));
    let start = prior.partition_point(|entry| entry.signal.date < window_start);
    let trailing: Vec<NormalizedSignal> = prior[start..]
        .iter()
        .map(|entry| normalize(&entry.signal, config))
        .collect();

    let mri_score = compute_mri(&normalize(signal, config), &trailing, config);
    let delta = risk::trailing_delta(
        signal.date,
        mri_score,
        prior.iter().map(|entry| &entry.record),
        config,
    );

    MriRecord {
        date: signal.date,
        mri_score,
        risk_level: risk::classify(mri_score, delta, config),
    }
}
