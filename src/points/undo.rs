// Remembers the last sale each session made, for a short undo window
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct LastSale {
    point_id: String,
    at: Instant,
}

pub struct UndoTracker {
    window: Duration,
    sales: HashMap<String, LastSale>,
}

impl UndoTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sales: HashMap::new(),
        }
    }

    /// Record a sale, replacing any earlier one for this session.
    pub fn record(&mut self, session: &str, point_id: &str) {
        self.record_at(session, point_id, Instant::now());
    }

    fn record_at(&mut self, session: &str, point_id: &str, at: Instant) {
        self.prune(at);
        self.sales.insert(
            session.to_string(),
            LastSale {
                point_id: point_id.to_string(),
                at,
            },
        );
    }

    /// The point this session may still undo, if the window is open.
    pub fn pending(&mut self, session: &str) -> Option<String> {
        self.pending_at(session, Instant::now())
    }

    fn pending_at(&mut self, session: &str, now: Instant) -> Option<String> {
        self.prune(now);
        self.sales.get(session).map(|s| s.point_id.clone())
    }

    /// Seconds left before the undo control disappears.
    pub fn remaining_secs(&self, session: &str) -> Option<u64> {
        let sale = self.sales.get(session)?;
        let left = self.window.checked_sub(sale.at.elapsed())?;
        Some(left.as_secs().max(1))
    }

    /// Forget the marker once the sale was undone, or when it names this point.
    pub fn clear(&mut self, session: &str, point_id: &str) {
        if self
            .sales
            .get(session)
            .is_some_and(|s| s.point_id == point_id)
        {
            self.sales.remove(session);
        }
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.sales
            .retain(|_, sale| now.saturating_duration_since(sale.at) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_within_window() {
        let mut tracker = UndoTracker::new(Duration::from_secs(30));
        tracker.record("s1", "p1");
        assert_eq!(tracker.pending("s1").as_deref(), Some("p1"));
        assert!(tracker.pending("s2").is_none());
    }

    #[test]
    fn later_sale_replaces_marker() {
        let mut tracker = UndoTracker::new(Duration::from_secs(30));
        tracker.record("s1", "p1");
        tracker.record("s1", "p2");
        assert_eq!(tracker.pending("s1").as_deref(), Some("p2"));
    }

    #[test]
    fn marker_expires_after_window() {
        let mut tracker = UndoTracker::new(Duration::from_secs(30));
        let start = Instant::now();
        tracker.record_at("s1", "p1", start);

        assert!(tracker
            .pending_at("s1", start + Duration::from_secs(29))
            .is_some());
        assert!(tracker
            .pending_at("s1", start + Duration::from_secs(30))
            .is_none());
    }

    #[test]
    fn zero_window_never_offers_undo() {
        let mut tracker = UndoTracker::new(Duration::ZERO);
        tracker.record("s1", "p1");
        assert!(tracker.pending("s1").is_none());
    }

    #[test]
    fn clear_only_removes_matching_point() {
        let mut tracker = UndoTracker::new(Duration::from_secs(30));
        tracker.record("s1", "p1");
        tracker.clear("s1", "other");
        assert!(tracker.pending("s1").is_some());
        tracker.clear("s1", "p1");
        assert!(tracker.pending("s1").is_none());
    }

    #[test]
    fn remaining_secs_counts_down() {
        let mut tracker = UndoTracker::new(Duration::from_secs(30));
        tracker.record("s1", "p1");
        let left = tracker.remaining_secs("s1").unwrap();
        assert!((1..=30).contains(&left));
        assert!(tracker.remaining_secs("nobody").is_none());
    }
}
