use tn_core::Connectivity;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Reconnected,
    WentOffline,
    Unchanged
}

/// Remembers the last reported network state so that only an
/// offline-to-online edge triggers reconciliation.
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    current: Connectivity
}

impl ConnectivityTracker {
    pub fn new(initial: Connectivity) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Connectivity {
        self.current
    }

    pub fn is_online(&self) -> bool {
        self.current == Connectivity::Online
    }

    pub fn observe(&mut self, next: Connectivity) -> Transition {
        let transition = match (self.current, next) {
            (Connectivity::Offline, Connectivity::Online) => Transition::Reconnected,
            (Connectivity::Online, Connectivity::Offline) => Transition::WentOffline,
            _ => Transition::Unchanged
        };
        if transition != Transition::Unchanged {
            info!(from = %self.current, to = %next, "Connectivity changed");
        }
        self.current = next;
        transition
    }
}

impl Default for ConnectivityTracker {
    fn default() -> Self {
        Self::new(Connectivity::Online)
    }
}
