//! Theme resolution & synchronization engine.
//!
//! Owns the requested theme, caches the live system preference, computes
//! the resolved theme, and sequences the side effects of every change:
//! best-effort persistence, document-root reflection, then observer
//! notification. All collaborators are optional; a missing one simply
//! skips its side effect (the headless mode of operation).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use crate::config::{ThemeAttribute, ThemeConfig, ThemeName, SYSTEM_THEME};
use crate::dom::{DocumentRoot, VirtualRoot};
use crate::error::ResultExt;
use crate::storage::{FileStorage, ThemeStorage};
use crate::system::{
    Appearance, AppearanceBridge, AppearanceSignal, AppearanceSubscription,
    PolledAppearanceSignal,
};

/// The pure resolution rule: a "system" request defers to the OS
/// preference while system-following is enabled; anything else passes
/// through verbatim (including "system" itself when following is off).
///
/// Returns `None` only when a "system" request cannot be resolved because
/// no preference has been observed (no display environment).
pub fn resolve(
    requested: &str,
    system: Option<Appearance>,
    enable_system: bool,
) -> Option<ThemeName> {
    if requested == SYSTEM_THEME && enable_system {
        system.map(|a| a.theme_name().to_string())
    } else {
        Some(requested.to_string())
    }
}

/// Collaborator bundle the engine runs against. Every collaborator is
/// optional; absence of all three is the headless mode.
#[derive(Clone, Default)]
pub struct ThemeEnvironment {
    storage: Option<Arc<dyn ThemeStorage>>,
    root: Option<Arc<dyn DocumentRoot>>,
    signal: Option<Arc<dyn AppearanceSignal>>,
}

impl ThemeEnvironment {
    /// No storage, no document root, no OS signal. Initialization and
    /// `set_theme` still work; every side effect is skipped.
    pub fn headless() -> Self {
        Self::default()
    }

    /// File-backed storage, an in-memory root, and the polling appearance
    /// signal.
    pub fn desktop() -> Self {
        Self::headless()
            .with_storage(Arc::new(FileStorage::new()))
            .with_root(Arc::new(VirtualRoot::new()))
            .with_signal(Arc::new(PolledAppearanceSignal::new()))
    }

    pub fn with_storage(mut self, storage: Arc<dyn ThemeStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_root(mut self, root: Arc<dyn DocumentRoot>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_signal(mut self, signal: Arc<dyn AppearanceSignal>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn is_headless(&self) -> bool {
        self.storage.is_none() && self.root.is_none() && self.signal.is_none()
    }

    pub fn storage(&self) -> Option<&Arc<dyn ThemeStorage>> {
        self.storage.as_ref()
    }

    pub fn root(&self) -> Option<&Arc<dyn DocumentRoot>> {
        self.root.as_ref()
    }

    pub fn signal(&self) -> Option<&Arc<dyn AppearanceSignal>> {
        self.signal.as_ref()
    }
}

/// Snapshot delivered to observers after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeChange {
    pub requested: ThemeName,
    pub resolved: Option<ThemeName>,
}

pub type ObserverId = u64;
type Observer = Arc<dyn Fn(&ThemeChange) + Send + Sync>;

struct EngineState {
    requested: ThemeName,
    system: Option<Appearance>,
}

/// Resolution engine. One instance per provider scope; create through
/// [`ThemeEngine::initialize`].
pub struct ThemeEngine {
    config: ThemeConfig,
    env: ThemeEnvironment,
    state: RwLock<EngineState>,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
}

/// Owns the engine plus its appearance subscription. Dropping the handle
/// stops the subscription; the engine itself has no further teardown.
pub struct EngineHandle {
    engine: Arc<ThemeEngine>,
    subscription: AppearanceSubscription,
}

impl EngineHandle {
    pub fn engine(&self) -> &Arc<ThemeEngine> {
        &self.engine
    }
}

impl std::ops::Deref for EngineHandle {
    type Target = ThemeEngine;

    fn deref(&self) -> &ThemeEngine {
        &self.engine
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.subscription.stop();
    }
}

impl ThemeEngine {
    /// Builds the engine: loads the requested theme from storage (absent,
    /// empty, or failing reads fall back to the configured default), seeds
    /// the system preference through the bridge, and performs one
    /// reflection pass. Defaults are never written back to storage here.
    pub fn initialize(config: ThemeConfig, env: ThemeEnvironment) -> EngineHandle {
        let requested =
            Self::stored_theme(&env, &config.storage_key).unwrap_or_else(|| config.fallback_theme());
        info!(
            requested = %requested,
            enable_system = config.enable_system,
            headless = env.is_headless(),
            "Theme engine initialized"
        );

        let engine = Arc::new(ThemeEngine {
            config,
            env,
            state: RwLock::new(EngineState {
                requested,
                system: None,
            }),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
        });

        let subscription = if engine.config.enable_system {
            match engine.env.signal() {
                Some(signal) => {
                    let weak = Arc::downgrade(&engine);
                    AppearanceBridge::start(signal.clone(), move |appearance| {
                        if let Some(engine) = weak.upgrade() {
                            engine.system_changed(appearance);
                        }
                    })
                }
                None => AppearanceSubscription::inert(),
            }
        } else {
            AppearanceSubscription::inert()
        };

        engine.reflect();
        EngineHandle {
            engine,
            subscription,
        }
    }

    fn stored_theme(env: &ThemeEnvironment, key: &str) -> Option<ThemeName> {
        let storage = env.storage()?;
        storage
            .get(key)
            .warn_on_err()
            .flatten()
            .filter(|value| !value.is_empty())
    }

    /// What the user (or the default configuration) asked for, including
    /// the "system" sentinel.
    pub fn requested_theme(&self) -> ThemeName {
        self.state
            .read()
            .map(|s| s.requested.clone())
            .unwrap_or_default()
    }

    /// The concrete theme after substituting the system preference. `None`
    /// when a "system" request has no observed preference to resolve
    /// against.
    pub fn resolved_theme(&self) -> Option<ThemeName> {
        self.state.read().ok().and_then(|s| {
            resolve(&s.requested, s.system, self.config.enable_system)
        })
    }

    /// Cached OS preference, if one has been observed.
    pub fn system_preference(&self) -> Option<Appearance> {
        self.state.read().ok().and_then(|s| s.system)
    }

    /// The configured theme names, in order.
    pub fn themes(&self) -> Vec<ThemeName> {
        self.config.themes.clone()
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Sets the requested theme. Persists it (best-effort), reflects the
    /// new resolution onto the document root, then notifies observers,
    /// all before returning.
    pub fn set_theme(&self, next: impl Into<ThemeName>) {
        let next = next.into();
        self.apply_request(|_| next);
    }

    /// Closure form of [`ThemeEngine::set_theme`]: computes the next theme
    /// from the previous one under the state lock, so a read-modify-write
    /// like a toggle cannot race a concurrent mutation.
    pub fn update_theme(&self, update: impl FnOnce(&ThemeName) -> ThemeName) {
        self.apply_request(update);
    }

    fn apply_request(&self, update: impl FnOnce(&ThemeName) -> ThemeName) {
        let (before, after) = {
            let Ok(mut state) = self.state.write() else {
                return;
            };
            let before = self.snapshot(&state);
            state.requested = update(&state.requested);
            (before, self.snapshot(&state))
        };

        self.persist(&after.requested);
        self.reflect();
        if after != before {
            self.notify(&after);
        }
    }

    /// Bridge callback: caches the preference, never persists it, and
    /// reflects/notifies only when it changes the current resolution
    /// (i.e. while the requested theme is "system").
    fn system_changed(&self, appearance: Appearance) {
        let (before, after) = {
            let Ok(mut state) = self.state.write() else {
                return;
            };
            let before = self.snapshot(&state);
            state.system = Some(appearance);
            (before, self.snapshot(&state))
        };

        debug!(mode = appearance.theme_name(), "System preference updated");
        if after != before {
            self.reflect();
            self.notify(&after);
        }
    }

    fn snapshot(&self, state: &EngineState) -> ThemeChange {
        ThemeChange {
            requested: state.requested.clone(),
            resolved: resolve(&state.requested, state.system, self.config.enable_system),
        }
    }

    fn persist(&self, requested: &str) {
        let Some(storage) = self.env.storage() else {
            return;
        };
        debug!(
            key = %self.config.storage_key,
            value = %requested,
            "Persisting requested theme"
        );
        storage
            .set(&self.config.storage_key, requested)
            .warn_on_err();
    }

    /// Writes the current resolution onto the document root. Recomputes
    /// from live state so the root never holds a stale intermediate value;
    /// repeated application is idempotent. Skipped without a root.
    fn reflect(&self) {
        let Some(root) = self.env.root() else {
            return;
        };
        let resolved = self.resolved_theme();

        match &self.config.attribute {
            ThemeAttribute::Class => {
                for theme in &self.config.themes {
                    root.remove_class(theme);
                }
                if let Some(resolved) = &resolved {
                    root.add_class(resolved);
                }
            }
            ThemeAttribute::Data(name) => match &resolved {
                Some(resolved) => root.set_attribute(name, resolved),
                None => root.remove_attribute(name),
            },
        }

        debug!(
            resolved = resolved.as_deref().unwrap_or("<none>"),
            attribute = %self.config.attribute,
            "Reflected resolved theme"
        );
    }

    /// Registers a change observer. Delivery is synchronous and in
    /// registration order.
    pub fn subscribe(
        &self,
        observer: impl Fn(&ThemeChange) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut observers) = self.observers.lock() {
            observers.push((id, Arc::new(observer)));
        }
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.retain(|(oid, _)| *oid != id);
        }
    }

    // Observers are cloned out of the registry before invocation so a
    // callback may subscribe/unsubscribe/set without deadlocking.
    fn notify(&self, change: &ThemeChange) {
        let observers: Vec<Observer> = match self.observers.lock() {
            Ok(list) => list.iter().map(|(_, o)| o.clone()).collect(),
            Err(_) => return,
        };
        for observer in observers {
            observer(change);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
