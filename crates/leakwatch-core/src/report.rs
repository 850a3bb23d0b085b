//! Leak reports produced by verification

use crate::event::AllocationEvent;
use crate::identity::ListenerIdentity;
use std::fmt;

/// One listener that was still registered at verification time
#[derive(Debug, Clone)]
pub struct LeakedListener {
    /// Tracker category the listener was registered under
    pub category: String,
    /// The listener
    pub identity: ListenerIdentity,
    /// Outstanding registrations, oldest first
    pub events: Vec<AllocationEvent>,
}

/// Every leak found by a verification pass
#[derive(Debug, Clone, Default)]
pub struct LeakReport {
    leaks: Vec<LeakedListener>,
    max_frames: Option<usize>,
}

impl LeakReport {
    pub(crate) fn new(leaks: Vec<LeakedListener>, max_frames: Option<usize>) -> Self {
        Self { leaks, max_frames }
    }

    /// Leaked listeners, in first-registration order per category
    pub fn leaks(&self) -> &[LeakedListener] {
        &self.leaks
    }

    /// Whether the report is empty
    pub fn is_clean(&self) -> bool {
        self.leaks.is_empty()
    }

    /// Number of leaked listeners
    pub fn leaked_listeners(&self) -> usize {
        self.leaks.len()
    }

    /// Number of outstanding registrations across all leaked listeners
    pub fn outstanding_events(&self) -> usize {
        self.leaks.iter().map(|leak| leak.events.len()).sum()
    }

    /// Leaks recorded under `category`
    pub fn for_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a LeakedListener> + 'a {
        self.leaks.iter().filter(move |leak| leak.category == category)
    }

    /// Find the leak for a specific listener
    pub fn find(&self, identity: &ListenerIdentity) -> Option<&LeakedListener> {
        self.leaks.iter().find(|leak| &leak.identity == identity)
    }

    /// Keep only the events `keep` accepts, dropping listeners left empty
    pub(crate) fn retain_events(&mut self, mut keep: impl FnMut(&str, &AllocationEvent) -> bool) {
        for leak in &mut self.leaks {
            let category = leak.category.as_str();
            leak.events.retain(|event| keep(category, event));
        }
        self.leaks.retain(|leak| !leak.events.is_empty());
    }

    pub(crate) fn merge(&mut self, other: LeakReport) {
        if self.max_frames.is_none() {
            self.max_frames = other.max_frames;
        }
        self.leaks.extend(other.leaks);
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "leak detected: {} listener(s) with {} outstanding registration(s)",
            self.leaked_listeners(),
            self.outstanding_events()
        )?;
        for leak in &self.leaks {
            write!(
                f,
                "\n  [{}] {} registered {} time(s) without unregistering",
                leak.category,
                leak.identity,
                leak.events.len()
            )?;
            for event in &leak.events {
                write!(f, "\n    ")?;
                event.write_limited(f, self.max_frames)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{BacktraceMode, LeakConfig};
    use crate::event::is_frame_header;
    use crate::identity::ListenerIdentity;
    use crate::tracker::LeakTracker;
    use std::sync::Arc;

    #[test]
    fn report_caps_frames_per_event() {
        let config = LeakConfig {
            backtrace: BacktraceMode::Full,
            max_report_frames: Some(2),
            ..LeakConfig::default()
        };
        let mut tracker = LeakTracker::with_config("receiver", &config);
        let receiver = Arc::new(0_u32);
        tracker.add(ListenerIdentity::of_arc(&receiver));

        let report = tracker.report();
        let event = &report.leaks()[0].events[0];
        // force_capture is unsupported on some targets.
        let Some(backtrace) = event.backtrace() else {
            return;
        };
        let total = backtrace.to_string().lines().filter(|l| is_frame_header(l)).count();

        let rendered = report.to_string();
        let shown = rendered.lines().filter(|l| is_frame_header(l)).count();
        assert_eq!(shown, total.min(2));
        if total > 2 {
            let suffix = format!("... {} more frames", total - 2);
            assert_eq!(rendered.lines().last().map(str::trim), Some(suffix.as_str()));
        } else {
            assert!(!rendered.contains("more frames"));
        }
    }
}
