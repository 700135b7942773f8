//! Orchestrator phases, the observable view and the pure request tracker.
//!
//! [`RequestTracker`] holds every rule about which response may touch the
//! display.  It does no I/O and owns no timers, so the interleavings can be
//! tested without a runtime.

use crate::translate::{RequestId, TranslationResult};

// ---------------------------------------------------------------------------
// RequestPhase
// ---------------------------------------------------------------------------

/// Where the orchestrator is in its request cycle.
///
/// ```text
/// Idle ──edit──▶ Pending ──quiet period──▶ InFlight ──latest settles──▶ Settled
///                  ▲   │                      │
///                  └───┘ edit (timer restart) └──stale settles──▶ Discarded
/// any ──blank edit / reset──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestPhase {
    /// Nothing scheduled or outstanding.
    #[default]
    Idle,
    /// Debounce timer armed.
    Pending,
    /// The latest request is waiting on the translator.
    InFlight,
    /// The latest request settled and was applied (result or notice).
    Settled,
    /// A superseded request settled and was dropped.
    Discarded,
}

impl RequestPhase {
    pub fn label(&self) -> &'static str {
        match self {
            RequestPhase::Idle => "Idle",
            RequestPhase::Pending => "Pending",
            RequestPhase::InFlight => "Translating",
            RequestPhase::Settled => "Done",
            RequestPhase::Discarded => "Discarded",
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationView
// ---------------------------------------------------------------------------

/// Everything a front-end renders for the translation pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationView {
    pub phase: RequestPhase,
    /// `true` while the latest issued request has not settled.
    pub loading: bool,
    /// Latest applied result; `None` after a clear.
    pub result: Option<TranslationResult>,
    /// Human-readable failure of the latest request, if it failed.
    pub notice: Option<String>,
    /// Id of the request `result` / `notice` came from.
    pub applied: Option<RequestId>,
}

impl TranslationView {
    /// Drop the displayed result and any notice.
    pub(crate) fn clear(&mut self) {
        self.phase = RequestPhase::Idle;
        self.loading = false;
        self.result = None;
        self.notice = None;
        self.applied = None;
    }
}

// ---------------------------------------------------------------------------
// RequestTracker
// ---------------------------------------------------------------------------

/// What to do with a settled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// It is the latest issued request: update the display and history.
    Apply,
    /// Superseded or invalidated: no state mutation, no history write.
    Discard,
}

/// Request id generator plus the "latest issued id" slot.
#[derive(Debug, Default)]
pub struct RequestTracker {
    last_id: RequestId,
    /// Latest issued id that has not settled or been invalidated.
    awaiting: Option<RequestId>,
    /// Calls still running, stale ones included.
    in_flight: usize,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and record it as the latest issued.
    pub fn issue(&mut self) -> RequestId {
        self.last_id += 1;
        self.awaiting = Some(self.last_id);
        self.in_flight += 1;
        self.last_id
    }

    /// Record that request `id` finished and decide its fate.
    pub fn settle(&mut self, id: RequestId) -> Settlement {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.awaiting == Some(id) {
            self.awaiting = None;
            Settlement::Apply
        } else {
            Settlement::Discard
        }
    }

    /// Make every outstanding request stale.
    pub fn invalidate(&mut self) {
        self.awaiting = None;
    }

    /// `true` while the latest issued request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn last_issued(&self) -> Option<RequestId> {
        (self.last_id > 0).then_some(self.last_id)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let mut t = RequestTracker::new();
        assert_eq!(t.last_issued(), None);
        let a = t.issue();
        let b = t.issue();
        let c = t.issue();
        assert!(a < b && b < c);
        assert_eq!(t.last_issued(), Some(c));
    }

    #[test]
    fn latest_applies() {
        let mut t = RequestTracker::new();
        let id = t.issue();
        assert!(t.is_loading());
        assert_eq!(t.settle(id), Settlement::Apply);
        assert!(!t.is_loading());
        assert_eq!(t.in_flight(), 0);
    }

    #[test]
    fn stale_after_newer_is_discarded() {
        let mut t = RequestTracker::new();
        let a = t.issue();
        let b = t.issue();
        assert_eq!(t.in_flight(), 2);

        assert_eq!(t.settle(b), Settlement::Apply);
        assert_eq!(t.settle(a), Settlement::Discard);
        assert_eq!(t.in_flight(), 0);
    }

    #[test]
    fn stale_before_newer_is_discarded() {
        let mut t = RequestTracker::new();
        let a = t.issue();
        let b = t.issue();

        assert_eq!(t.settle(a), Settlement::Discard);
        assert!(t.is_loading());
        assert_eq!(t.settle(b), Settlement::Apply);
    }

    #[test]
    fn invalidate_discards_outstanding() {
        let mut t = RequestTracker::new();
        let a = t.issue();
        t.invalidate();
        assert!(!t.is_loading());
        assert_eq!(t.settle(a), Settlement::Discard);

        let b = t.issue();
        assert_eq!(t.settle(b), Settlement::Apply);
    }

    #[test]
    fn settling_twice_applies_once() {
        let mut t = RequestTracker::new();
        let a = t.issue();
        assert_eq!(t.settle(a), Settlement::Apply);
        assert_eq!(t.settle(a), Settlement::Discard);
    }

    #[test]
    fn clear_resets_view() {
        let mut view = TranslationView {
            phase: RequestPhase::Settled,
            loading: true,
            notice: Some("oops".into()),
            applied: Some(3),
            ..TranslationView::default()
        };
        view.clear();
        assert_eq!(view, TranslationView::default());
    }
}
