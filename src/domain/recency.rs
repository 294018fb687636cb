// Tracks the last record seen by the poller so it can be highlighted

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecencyTracker {
    last_id: Option<i64>,
}

impl RecencyTracker {
    /// Record a live id. Called on every successful poll, even when unchanged.
    pub fn observe(&mut self, id: i64) {
        self.last_id = Some(id);
    }

    pub fn last_id(&self) -> Option<i64> {
        self.last_id
    }

    pub fn is_recent(&self, id: i64) -> bool {
        self.last_id == Some(id)
    }
}
