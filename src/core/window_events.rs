use crate::core::geometry::Rect;
use crate::core::window_geometry::GeometryEvent;

/// Derives maximize/minimize transitions from the window's state flags.
///
/// The host only reports moves and resizes; each report carries the
/// maximized/minimized flags read at that moment, and any flip since the last
/// report becomes a transition event.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    maximized: bool,
    minimized: bool,
}

impl TransitionTracker {
    pub fn new(maximized: bool, minimized: bool) -> Self {
        Self {
            maximized,
            minimized,
        }
    }

    pub fn observe(&mut self, maximized: bool, minimized: bool) -> Vec<GeometryEvent> {
        let mut events = Vec::new();

        if minimized != self.minimized {
            events.push(if minimized {
                GeometryEvent::Minimized
            } else {
                GeometryEvent::Restored
            });
        }
        if maximized != self.maximized {
            events.push(if maximized {
                GeometryEvent::Maximized
            } else {
                GeometryEvent::Unmaximized
            });
        }

        self.maximized = maximized;
        self.minimized = minimized;
        events
    }
}

/// Detects display configuration changes by comparing monitor snapshots.
#[derive(Debug, Default)]
pub struct DisplayWatcher {
    last: Option<Vec<Rect>>,
}

impl DisplayWatcher {
    pub fn new(initial: Vec<Rect>) -> Self {
        Self {
            last: Some(initial),
        }
    }

    /// Records `screens` and reports whether they differ from the previous
    /// snapshot. An empty list is kept out of the snapshot, so a monitor that
    /// briefly disappears during reconfiguration isn't reported twice.
    pub fn observe(&mut self, screens: Vec<Rect>) -> bool {
        if screens.is_empty() {
            return false;
        }
        if self.last.as_ref() == Some(&screens) {
            return false;
        }
        let changed = self.last.is_some();
        self.last = Some(screens);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_and_unmaximize_are_reported_once() {
        let mut tracker = TransitionTracker::default();
        assert!(tracker.observe(false, false).is_empty());
        assert_eq!(tracker.observe(true, false), vec![GeometryEvent::Maximized]);
        assert!(tracker.observe(true, false).is_empty());
        assert_eq!(tracker.observe(false, false), vec![GeometryEvent::Unmaximized]);
    }

    #[test]
    fn minimizing_a_maximized_window_reports_minimize_then_restore() {
        let mut tracker = TransitionTracker::new(true, false);
        assert_eq!(tracker.observe(true, true), vec![GeometryEvent::Minimized]);
        assert_eq!(tracker.observe(true, false), vec![GeometryEvent::Restored]);
    }

    #[test]
    fn restoring_from_minimized_straight_to_normal_reports_both() {
        let mut tracker = TransitionTracker::new(true, true);
        assert_eq!(
            tracker.observe(false, false),
            vec![GeometryEvent::Restored, GeometryEvent::Unmaximized]
        );
    }

    #[test]
    fn display_watcher_reports_changes_only() {
        let main = Rect::new(0, 0, 1920, 1080);
        let second = Rect::new(1920, 0, 1280, 1024);
        let mut watcher = DisplayWatcher::new(vec![main, second]);

        assert!(!watcher.observe(vec![main, second]));
        assert!(watcher.observe(vec![main]));
        assert!(!watcher.observe(vec![main]));
        assert!(!watcher.observe(Vec::new()));
        assert!(!watcher.observe(vec![main]));
        assert!(watcher.observe(vec![Rect::new(0, 0, 2560, 1440)]));
    }

    #[test]
    fn first_snapshot_is_a_baseline() {
        let mut watcher = DisplayWatcher::default();
        assert!(!watcher.observe(vec![Rect::new(0, 0, 1920, 1080)]));
        assert!(watcher.observe(vec![Rect::new(0, 0, 1280, 720)]));
    }
}
