//! Preference Bridge: the OS color-scheme signal.
//!
//! Translates the operating system's appearance signal into preference
//! updates for the resolution engine. The signal itself is abstract in the
//! legacy add/remove-listener style so older notification APIs can sit
//! behind it unchanged; [`PolledAppearanceSignal`] is the built-in
//! implementation (polls `defaults read -g AppleInterfaceStyle`), and
//! [`ManualSignal`] is a programmatically driven one for environments
//! without OS detection.

use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

/// OS-reported color scheme, independent of any user override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Dark,
    Light,
}

impl Appearance {
    /// The theme name this preference resolves to.
    pub fn theme_name(self) -> &'static str {
        match self {
            Appearance::Dark => "dark",
            Appearance::Light => "light",
        }
    }

    /// Maps a "prefers dark color scheme" match result.
    pub fn from_dark_match(matches: bool) -> Self {
        if matches {
            Appearance::Dark
        } else {
            Appearance::Light
        }
    }
}

pub type ListenerId = u64;
pub type AppearanceListener = Arc<dyn Fn(Appearance) + Send + Sync>;

/// Query surface for the OS color-scheme preference: a one-shot current
/// read plus change subscription in the legacy add/remove-listener style.
///
/// Implementations must not invoke a listener once `remove_listener` for
/// its id has returned.
pub trait AppearanceSignal: Send + Sync {
    fn current(&self) -> Appearance;
    fn add_listener(&self, listener: AppearanceListener) -> ListenerId;
    fn remove_listener(&self, id: ListenerId);
}

/// Wires an [`AppearanceSignal`] to a callback.
pub struct AppearanceBridge;

impl AppearanceBridge {
    /// Reads the current preference, synchronously invokes `on_change` with
    /// it, then registers a live listener for future changes. The returned
    /// subscription must be stopped when the owning scope ends.
    pub fn start(
        signal: Arc<dyn AppearanceSignal>,
        on_change: impl Fn(Appearance) + Send + Sync + 'static,
    ) -> AppearanceSubscription {
        let on_change: AppearanceListener = Arc::new(on_change);
        on_change(signal.current());
        let id = signal.add_listener(on_change);
        debug!(listener_id = id, "Appearance bridge started");
        AppearanceSubscription {
            signal: Some((signal, id)),
            stopped: AtomicBool::new(false),
        }
    }
}

/// Live change subscription handed out by [`AppearanceBridge::start`].
///
/// Dropped subscriptions stop themselves.
pub struct AppearanceSubscription {
    signal: Option<(Arc<dyn AppearanceSignal>, ListenerId)>,
    stopped: AtomicBool,
}

impl AppearanceSubscription {
    /// A subscription that was never live. Used where no display
    /// environment exists: nothing ever fires, `stop` is a no-op.
    pub fn inert() -> Self {
        AppearanceSubscription {
            signal: None,
            stopped: AtomicBool::new(false),
        }
    }

    /// Deregisters the listener. Idempotent; once `stop` returns, no
    /// further callback fires.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some((signal, id)) = &self.signal {
            signal.remove_listener(*id);
            debug!(listener_id = id, "Appearance bridge stopped");
        }
    }
}

impl Drop for AppearanceSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, AppearanceListener)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    fn add(&self, listener: AppearanceListener) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, listener));
        }
        id
    }

    fn remove(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(lid, _)| *lid != id);
        }
    }

    // Listeners are invoked under the registry lock so that a completed
    // remove() guarantees quiescence.
    fn notify(&self, appearance: Appearance) {
        if let Ok(listeners) = self.listeners.lock() {
            for (_, listener) in listeners.iter() {
                listener(appearance);
            }
        }
    }
}

/// How often the polled signal re-reads the system appearance
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Background-polling appearance signal.
///
/// Spawns a thread that re-reads the system appearance every 2 seconds and
/// fans changes out to registered listeners. The thread shuts down once the
/// signal is dropped.
pub struct PolledAppearanceSignal {
    registry: Arc<ListenerRegistry>,
}

impl PolledAppearanceSignal {
    pub fn new() -> Self {
        let registry = Arc::new(ListenerRegistry::default());
        let weak = Arc::downgrade(&registry);
        thread::spawn(move || Self::poll_loop(weak));
        PolledAppearanceSignal { registry }
    }

    fn poll_loop(registry: Weak<ListenerRegistry>) {
        let mut last = detect_appearance();
        info!(
            poll_interval_secs = POLL_INTERVAL.as_secs(),
            mode = last.theme_name(),
            "Appearance poller started"
        );

        loop {
            thread::sleep(POLL_INTERVAL);

            let Some(registry) = registry.upgrade() else {
                debug!("Appearance signal dropped, poller shutting down");
                break;
            };

            let current = detect_appearance();
            if current != last {
                info!(mode = current.theme_name(), "System appearance changed");
                registry.notify(current);
                last = current;
            }
        }
    }
}

impl Default for PolledAppearanceSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AppearanceSignal for PolledAppearanceSignal {
    fn current(&self) -> Appearance {
        detect_appearance()
    }

    fn add_listener(&self, listener: AppearanceListener) -> ListenerId {
        self.registry.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.registry.remove(id);
    }
}

/// Detect the current system appearance.
///
/// Uses `defaults read -g AppleInterfaceStyle`; in light mode the key is
/// absent and the command fails, so failures read as light. Non-macOS
/// systems report light for the same reason.
pub fn detect_appearance() -> Appearance {
    match Command::new("defaults")
        .args(["read", "-g", "AppleInterfaceStyle"])
        .output()
    {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Appearance::from_dark_match(stdout.to_lowercase().contains("dark"))
        }
        Err(_) => Appearance::Light,
    }
}

/// Manually driven appearance signal.
///
/// Reports a programmatically set value and notifies listeners on
/// [`ManualSignal::set`]. Useful for tests and for embedding the engine in
/// environments that detect appearance through some channel of their own.
pub struct ManualSignal {
    current: Mutex<Appearance>,
    registry: ListenerRegistry,
}

impl ManualSignal {
    pub fn new(initial: Appearance) -> Self {
        ManualSignal {
            current: Mutex::new(initial),
            registry: ListenerRegistry::default(),
        }
    }

    /// Change the reported appearance and notify listeners of the new
    /// value.
    pub fn set(&self, appearance: Appearance) {
        if let Ok(mut current) = self.current.lock() {
            *current = appearance;
        }
        self.registry.notify(appearance);
    }
}

impl AppearanceSignal for ManualSignal {
    fn current(&self) -> Appearance {
        self.current
            .lock()
            .map(|a| *a)
            .unwrap_or(Appearance::Light)
    }

    fn add_listener(&self, listener: AppearanceListener) -> ListenerId {
        self.registry.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.registry.remove(id);
    }
}
