use crate::core::app_log;
use crate::core::persistence::WindowRecordStore;
use crate::core::window_events::{DisplayWatcher, TransitionTracker};
use crate::core::window_geometry::{GeometryEvent, ScreenHost, WindowGeometryManager, WindowHost};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// How often monitors are compared when nothing else wakes the worker.
const DISPLAY_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryMessage {
    Moved {
        x: i32,
        y: i32,
        maximized: bool,
        minimized: bool,
    },
    Resized {
        width: u32,
        height: u32,
        maximized: bool,
        minimized: bool,
    },
    /// The host hinted at a display change (e.g. a scale factor change).
    DisplayChanged,
    /// The user asked to close the window. Pending saves land first, then the
    /// worker closes the window and stops.
    Close,
}

static GEOMETRY_TX: Lazy<Mutex<Option<Sender<GeometryMessage>>>> = Lazy::new(|| Mutex::new(None));

/// Everything the worker thread owns. All window-geometry state is touched
/// from this one place.
pub struct GeometryWorker<W, S, R, D> {
    manager: WindowGeometryManager<W, S, R>,
    tracker: TransitionTracker,
    watcher: DisplayWatcher,
    displays: D,
}

impl<W, S, R, D> GeometryWorker<W, S, R, D>
where
    W: WindowHost,
    S: ScreenHost,
    R: WindowRecordStore,
    D: ScreenHost,
{
    pub fn new(
        manager: WindowGeometryManager<W, S, R>,
        tracker: TransitionTracker,
        displays: D,
    ) -> Self {
        let watcher = DisplayWatcher::new(displays.screens());
        Self {
            manager,
            tracker,
            watcher,
            displays,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.manager.next_deadline()
    }

    pub fn handle(&mut self, message: GeometryMessage, now: Instant) {
        match message {
            GeometryMessage::Moved {
                x,
                y,
                maximized,
                minimized,
            } => {
                self.transitions(maximized, minimized, now);
                self.manager.handle_event(GeometryEvent::Moved { x, y }, now);
            }
            GeometryMessage::Resized {
                width,
                height,
                maximized,
                minimized,
            } => {
                self.transitions(maximized, minimized, now);
                self.manager
                    .handle_event(GeometryEvent::Resized { width, height }, now);
            }
            GeometryMessage::DisplayChanged => self.check_displays(now, true),
            GeometryMessage::Close => self.manager.close(),
        }
    }

    fn transitions(&mut self, maximized: bool, minimized: bool, now: Instant) {
        for event in self.tracker.observe(maximized, minimized) {
            self.manager.handle_event(event, now);
        }
    }

    pub fn poll(&mut self, now: Instant) {
        self.manager.poll(now);
    }

    /// Compares the current monitors with the last snapshot and re-validates
    /// the window when they changed (or when `forced`).
    pub fn check_displays(&mut self, now: Instant, forced: bool) {
        let changed = self.watcher.observe(self.displays.screens());
        if changed {
            app_log::info("window/displays", "changed");
        }
        if changed || forced {
            self.manager
                .handle_event(GeometryEvent::DisplayBoundsChanged, now);
        }
    }
}

/// Moves the worker onto its own thread and routes `send` to it.
pub fn start<W, S, R, D>(worker: GeometryWorker<W, S, R, D>)
where
    W: WindowHost + Send + 'static,
    S: ScreenHost + Send + 'static,
    R: WindowRecordStore + Send + 'static,
    D: ScreenHost + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<GeometryMessage>();
    *GEOMETRY_TX.lock() = Some(tx);

    std::thread::spawn(move || run(worker, rx));
}

pub fn send(message: GeometryMessage) {
    deliver(message);
}

/// Hands the close over to the worker. Returns false when no worker is
/// running, in which case the caller should let the window close itself.
pub fn request_close() -> bool {
    deliver(GeometryMessage::Close)
}

fn deliver(message: GeometryMessage) -> bool {
    match GEOMETRY_TX.lock().as_ref() {
        Some(tx) => tx.send(message).is_ok(),
        None => false,
    }
}

fn run<W, S, R, D>(mut worker: GeometryWorker<W, S, R, D>, rx: Receiver<GeometryMessage>)
where
    W: WindowHost,
    S: ScreenHost,
    R: WindowRecordStore,
    D: ScreenHost,
{
    let mut next_display_poll = Instant::now() + DISPLAY_POLL_INTERVAL;

    loop {
        let wake_at = worker
            .next_deadline()
            .map_or(next_display_poll, |deadline| deadline.min(next_display_poll));
        let timeout = wake_at.saturating_duration_since(Instant::now());

        match rx.recv_timeout(timeout) {
            Ok(first) => {
                for message in std::iter::once(first).chain(rx.try_iter()) {
                    worker.handle(message, Instant::now());
                    if message == GeometryMessage::Close {
                        GEOMETRY_TX.lock().take();
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        let now = Instant::now();
        worker.poll(now);
        if now >= next_display_poll {
            worker.check_displays(now, false);
            next_display_poll = now + DISPLAY_POLL_INTERVAL;
        }
    }
}
