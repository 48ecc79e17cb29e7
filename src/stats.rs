use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
};

/// Diagnostic counters reported by `lookup_statistics`, keyed by name.
pub type Statistics = BTreeMap<&'static str, f64>;

/// Probe sequence lengths observed while looking up a dataset.
///
/// - Every key that is found contributes its PSL to `min_psl`, `max_psl` and
///   `total_psl`.
/// - `average_psl` divides `total_psl` by the number of keys looked up, so keys
///   that were never inserted pull the average down.
#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct PslStats {
    lookup_count: u64,
    found_count: u64,
    min_psl: Option<usize>,
    max_psl: usize,
    total_psl: u64,
}

impl Debug for PslStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PslStats")
            .field("lookup_count", &self.lookup_count)
            .field("found_count", &self.found_count)
            .field("min_psl", &self.min_psl())
            .field("max_psl", &self.max_psl)
            .field("total_psl", &self.total_psl)
            .field("average_psl", &self.average_psl())
            .finish()
    }
}

impl PslStats {
    pub(crate) fn record_found(&mut self, psl: usize) {
        self.lookup_count += 1;
        self.found_count += 1;
        self.min_psl = Some(self.min_psl.map_or(psl, |m| m.min(psl)));
        self.max_psl = self.max_psl.max(psl);
        self.total_psl += psl as u64;
    }

    pub(crate) fn record_missing(&mut self) {
        self.lookup_count += 1;
    }

    pub(crate) fn min_psl(&self) -> usize {
        self.min_psl.unwrap_or(0)
    }

    pub(crate) fn average_psl(&self) -> f64 {
        if self.lookup_count == 0 {
            0.0
        } else {
            self.total_psl as f64 / self.lookup_count as f64
        }
    }

    pub(crate) fn into_statistics(self) -> Statistics {
        Statistics::from([
            ("min_psl", self.min_psl() as f64),
            ("max_psl", self.max_psl as f64),
            ("average_psl", self.average_psl()),
            ("total_psl", self.total_psl as f64),
        ])
    }
}
