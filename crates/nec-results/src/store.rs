//! In-memory result storage keyed by (frequency step, request).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nec_core::RequestId;
use serde::{Deserialize, Serialize};

use crate::types::{CouplingResult, CurrentReport, NearFieldResult, PatternResult, StepSummary};
use crate::{ResultsError, ResultsResult};

/// Frequency step index and output request sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub step: usize,
    pub request: RequestId,
}

impl ResultKey {
    pub fn new(step: usize, request: RequestId) -> Self {
        Self { step, request }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResultSet {
    Pattern(PatternResult),
    NearField(NearFieldResult),
    Currents(CurrentReport),
    Coupling(CouplingResult),
}

impl ResultSet {
    pub fn as_pattern(&self) -> Option<&PatternResult> {
        match self {
            ResultSet::Pattern(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportEntry {
    step: usize,
    request: RequestId,
    result: ResultSet,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Export {
    summaries: Vec<StepSummary>,
    results: Vec<ExportEntry>,
}

/// Every result set and step summary a context has produced.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: BTreeMap<ResultKey, ResultSet>,
    summaries: BTreeMap<usize, StepSummary>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result set, replacing any previous one with the same key.
    pub fn insert(&mut self, key: ResultKey, set: ResultSet) {
        self.results.insert(key, set);
    }

    pub fn get(&self, key: &ResultKey) -> Option<&ResultSet> {
        self.results.get(key)
    }

    pub fn require(&self, key: &ResultKey) -> ResultsResult<&ResultSet> {
        self.results.get(key).ok_or(ResultsError::NotFound {
            step: key.step,
            request: key.request.number(),
        })
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.summaries.is_empty()
    }

    /// Results of one frequency step in request order.
    pub fn at_step(&self, step: usize) -> impl Iterator<Item = (&ResultKey, &ResultSet)> {
        self.results.range(step_range(step))
    }

    pub fn patterns_at(&self, step: usize) -> impl Iterator<Item = &PatternResult> {
        self.at_step(step).filter_map(|(_, set)| set.as_pattern())
    }

    /// Most recent total-normalized pattern at `step`.
    pub fn latest_total_pattern(&self, step: usize) -> Option<&PatternResult> {
        self.patterns_at(step)
            .filter(|p| p.is_total_normalized())
            .last()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &ResultSet)> {
        self.results.iter()
    }

    pub fn set_summary(&mut self, summary: StepSummary) {
        self.summaries.insert(summary.step, summary);
    }

    pub fn summary(&self, step: usize) -> Option<&StepSummary> {
        self.summaries.get(&step)
    }

    pub fn summaries(&self) -> impl Iterator<Item = &StepSummary> {
        self.summaries.values()
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.summaries.clear();
    }

    pub fn to_json(&self) -> ResultsResult<String> {
        let export = Export {
            summaries: self.summaries.values().copied().collect(),
            results: self
                .results
                .iter()
                .map(|(key, set)| ExportEntry {
                    step: key.step,
                    request: key.request,
                    result: set.clone(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    pub fn from_json(json: &str) -> ResultsResult<Self> {
        let export: Export = serde_json::from_str(json)?;
        let mut store = Self::new();
        for summary in export.summaries {
            store.set_summary(summary);
        }
        for entry in export.results {
            store.insert(ResultKey::new(entry.step, entry.request), entry.result);
        }
        Ok(store)
    }

    pub fn save_json(&self, path: &Path) -> ResultsResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> ResultsResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

fn step_range(step: usize) -> std::ops::RangeInclusive<ResultKey> {
    let first = ResultKey::new(step, RequestId::from_index(0));
    let last = ResultKey::new(step, RequestId::from_index(u32::MAX - 1));
    first..=last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Normalization, PatternSettings};
    use nec_core::Cplx;

    fn pattern(step: usize, request: u32, normalization: Normalization) -> ResultSet {
        let settings = PatternSettings {
            normalization,
            ..PatternSettings::default()
        };
        let point = crate::PatternPoint::from_field(
            90.0,
            0.0,
            Cplx::new(1.0, 0.0),
            Cplx::new(0.0, 0.0),
            |f2| f2 * (request + 1) as f64,
        );
        ResultSet::Pattern(PatternResult::new(
            step,
            RequestId::from_index(request),
            30.0,
            1,
            1,
            settings,
            false,
            vec![point],
        ))
    }

    #[test]
    fn latest_total_pattern_skips_other_normalizations() {
        let mut store = ResultStore::new();
        store.insert(
            ResultKey::new(0, RequestId::from_index(0)),
            pattern(0, 0, Normalization::Total),
        );
        store.insert(
            ResultKey::new(0, RequestId::from_index(1)),
            pattern(0, 1, Normalization::Total),
        );
        store.insert(
            ResultKey::new(0, RequestId::from_index(2)),
            pattern(0, 2, Normalization::Major),
        );
        store.insert(
            ResultKey::new(1, RequestId::from_index(3)),
            pattern(1, 3, Normalization::Total),
        );

        let latest = store.latest_total_pattern(0).unwrap();
        assert_eq!(latest.request, RequestId::from_index(1));
        assert_eq!(store.patterns_at(0).count(), 3);
        assert_eq!(store.at_step(1).count(), 1);
        assert!(store.latest_total_pattern(2).is_none());
    }

    #[test]
    fn require_reports_missing_key() {
        let store = ResultStore::new();
        let err = store
            .require(&ResultKey::new(4, RequestId::from_index(6)))
            .unwrap_err();
        assert!(matches!(err, ResultsError::NotFound { step: 4, request: 7 }));
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = ResultStore::new();
        store.insert(
            ResultKey::new(0, RequestId::from_index(0)),
            pattern(0, 0, Normalization::Total),
        );
        store.set_summary(StepSummary {
            step: 0,
            frequency_mhz: 30.0,
            impedance: None,
            input_power: 0.0,
            loss_power: 0.0,
        });
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
