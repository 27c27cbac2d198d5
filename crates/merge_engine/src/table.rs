//! Global admission table.

/// One admitted event: when it happened and which stream owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionRecord {
    pub time: f64,
    pub stream: usize,
}

/// Time-ordered record of every admission in the current dataset.
///
/// The scheduler only admits at non-decreasing clock values, so a vector
/// in push order is already sorted. Two admissions at numerically equal
/// times keep their insertion order instead of colliding on a key.
#[derive(Debug, Default)]
pub struct AdmissionTable {
    records: Vec<AdmissionRecord>,
}

impl AdmissionTable {
    pub fn push(&mut self, time: f64, stream: usize) {
        debug_assert!(
            self.records.last().is_none_or(|last| last.time <= time),
            "admission times must be non-decreasing"
        );
        self.records.push(AdmissionRecord { time, stream });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AdmissionRecord] {
        &self.records
    }

    pub fn last_time(&self) -> Option<f64> {
        self.records.last().map(|record| record.time)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut table = AdmissionTable::default();
        table.push(0.5, 1);
        table.push(1.25, 0);
        table.push(3.0, 1);

        assert_eq!(table.len(), 3);
        assert_eq!(table.last_time(), Some(3.0));
        let streams: Vec<usize> = table.records().iter().map(|r| r.stream).collect();
        assert_eq!(streams, vec![1, 0, 1]);
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut table = AdmissionTable::default();
        table.push(2.0, 3);
        table.push(2.0, 7);

        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].stream, 3);
        assert_eq!(table.records()[1].stream, 7);
    }

    #[test]
    fn clear_empties_the_table() {
        let mut table = AdmissionTable::default();
        table.push(1.0, 0);
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.last_time(), None);
    }
}
