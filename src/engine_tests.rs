use super::*;
use crate::error::{Result, ThemeKitError};
use crate::storage::MemoryStorage;
use crate::system::ManualSignal;
use std::sync::Mutex;

/// Storage double that records every get/set key so tests can assert on
/// exact traffic.
#[derive(Default)]
struct RecordingStorage {
    inner: MemoryStorage,
    gets: Mutex<Vec<String>>,
    sets: Mutex<Vec<(String, String)>>,
}

impl RecordingStorage {
    fn new() -> Self {
        Self::default()
    }

    fn set_count(&self) -> usize {
        self.sets.lock().unwrap().len()
    }

    fn sets(&self) -> Vec<(String, String)> {
        self.sets.lock().unwrap().clone()
    }

    fn get_keys(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }
}

impl ThemeStorage for RecordingStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.lock().unwrap().push(key.to_string());
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.sets
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.inner.set(key, value)
    }
}

/// Storage double whose every access fails.
struct BrokenStorage;

impl ThemeStorage for BrokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Err(ThemeKitError::Storage {
            key: key.to_string(),
            source: std::io::Error::other("storage denied"),
        })
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(ThemeKitError::Storage {
            key: key.to_string(),
            source: std::io::Error::other("storage denied"),
        })
    }
}

fn display_env(
    storage: &Arc<RecordingStorage>,
    root: &Arc<VirtualRoot>,
    signal: &Arc<ManualSignal>,
) -> ThemeEnvironment {
    ThemeEnvironment::headless()
        .with_storage(storage.clone())
        .with_root(root.clone())
        .with_signal(signal.clone())
}

#[test]
fn test_resolve_is_pure_substitution() {
    // "system" + enabled defers to the observed preference
    assert_eq!(
        resolve(SYSTEM_THEME, Some(Appearance::Dark), true),
        Some("dark".into())
    );
    assert_eq!(
        resolve(SYSTEM_THEME, Some(Appearance::Light), true),
        Some("light".into())
    );
    assert_eq!(resolve(SYSTEM_THEME, None, true), None);

    // Everything else passes through verbatim
    assert_eq!(
        resolve("dark", Some(Appearance::Light), true),
        Some("dark".into())
    );
    assert_eq!(resolve("sepia", None, true), Some("sepia".into()));

    // With following disabled, "system" is just an opaque name
    assert_eq!(
        resolve(SYSTEM_THEME, Some(Appearance::Dark), false),
        Some("system".into())
    );
}

#[test]
fn test_initialize_defaults_to_system() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );

    assert_eq!(engine.requested_theme(), "system");
    assert_eq!(engine.resolved_theme(), Some("light".into()));
}

#[test]
fn test_initialize_defaults_to_light_without_system_following() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Dark));

    let config = ThemeConfig {
        enable_system: false,
        ..ThemeConfig::default()
    };
    let engine = ThemeEngine::initialize(config, display_env(&storage, &root, &signal));

    assert_eq!(engine.requested_theme(), "light");
    // The signal is never consulted
    assert_eq!(engine.system_preference(), None);
}

#[test]
fn test_initialize_does_not_persist_the_default() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let config = ThemeConfig {
        default_theme: Some("dark".into()),
        ..ThemeConfig::default()
    };
    let engine = ThemeEngine::initialize(config, display_env(&storage, &root, &signal));

    assert_eq!(engine.requested_theme(), "dark");
    assert_eq!(storage.set_count(), 0);
    assert_eq!(storage.get("theme").unwrap(), None);
}

#[test]
fn test_set_theme_persists_exactly_once() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    engine.set_theme("dark");

    assert_eq!(engine.requested_theme(), "dark");
    assert_eq!(storage.sets(), vec![("theme".to_string(), "dark".to_string())]);
}

#[test]
fn test_stored_theme_wins_over_default() {
    let storage = Arc::new(RecordingStorage::new());
    storage.set("theme", "sepia").unwrap();
    storage.sets.lock().unwrap().clear();
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );

    assert_eq!(engine.requested_theme(), "sepia");
    assert_eq!(engine.resolved_theme(), Some("sepia".into()));
}

#[test]
fn test_empty_stored_value_falls_back_to_default() {
    let storage = Arc::new(RecordingStorage::new());
    storage.set("theme", "").unwrap();
    storage.sets.lock().unwrap().clear();
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );

    assert_eq!(engine.requested_theme(), "system");
}

#[test]
fn test_update_theme_toggles_from_previous() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    engine.set_theme("dark");

    let toggle = |prev: &ThemeName| -> ThemeName {
        if prev == "dark" {
            "light".into()
        } else {
            "dark".into()
        }
    };

    engine.update_theme(toggle);
    assert_eq!(engine.requested_theme(), "light");
    engine.update_theme(toggle);
    assert_eq!(engine.requested_theme(), "dark");
}

#[test]
fn test_data_attribute_reflection() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    assert_eq!(root.attribute("data-theme"), Some("light".into()));

    engine.set_theme("dark");
    assert_eq!(root.attribute("data-theme"), Some("dark".into()));

    engine.set_theme("light");
    assert_eq!(root.attribute("data-theme"), Some("light".into()));
}

#[test]
fn test_class_reflection_swaps_without_duplicates() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let config = ThemeConfig {
        attribute: ThemeAttribute::Class,
        ..ThemeConfig::default()
    };
    let engine = ThemeEngine::initialize(config, display_env(&storage, &root, &signal));

    engine.set_theme("dark");
    assert!(root.has_class("dark"));
    assert!(!root.has_class("light"));

    // Repeated identical sets leave a single entry
    engine.set_theme("dark");
    engine.set_theme("dark");
    assert_eq!(root.classes(), vec!["dark"]);

    engine.set_theme("light");
    assert!(root.has_class("light"));
    assert!(!root.has_class("dark"));
}

#[test]
fn test_custom_storage_key_is_the_only_key_touched() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let config = ThemeConfig {
        storage_key: "custom-storage".into(),
        ..ThemeConfig::default()
    };
    let engine = ThemeEngine::initialize(config, display_env(&storage, &root, &signal));
    engine.set_theme("dark");

    assert_eq!(storage.get_keys(), vec!["custom-storage"]);
    assert_eq!(
        storage.sets(),
        vec![("custom-storage".to_string(), "dark".to_string())]
    );
}

#[test]
fn test_headless_engine_has_no_side_effects() {
    let engine = ThemeEngine::initialize(ThemeConfig::default(), ThemeEnvironment::headless());

    assert_eq!(engine.requested_theme(), "system");
    // No preference can be observed without a display environment
    assert_eq!(engine.resolved_theme(), None);

    engine.set_theme("dark");
    assert_eq!(engine.requested_theme(), "dark");
    assert_eq!(engine.resolved_theme(), Some("dark".into()));
}

#[test]
fn test_broken_storage_degrades_to_default() {
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Dark));
    let env = ThemeEnvironment::headless()
        .with_storage(Arc::new(BrokenStorage))
        .with_root(root.clone())
        .with_signal(signal.clone());

    let engine = ThemeEngine::initialize(ThemeConfig::default(), env);
    assert_eq!(engine.requested_theme(), "system");
    assert_eq!(root.attribute("data-theme"), Some("dark".into()));

    // Write failures are swallowed; in-memory state still advances
    engine.set_theme("light");
    assert_eq!(engine.requested_theme(), "light");
    assert_eq!(root.attribute("data-theme"), Some("light".into()));
}

#[test]
fn test_system_change_reflects_while_following() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    assert_eq!(root.attribute("data-theme"), Some("light".into()));

    signal.set(Appearance::Dark);
    assert_eq!(engine.resolved_theme(), Some("dark".into()));
    assert_eq!(root.attribute("data-theme"), Some("dark".into()));
    // A preference change is not a user choice
    assert_eq!(storage.set_count(), 0);
}

#[test]
fn test_system_change_is_absorbed_while_theme_is_explicit() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    engine.set_theme("dark");

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    engine.subscribe(move |change: &ThemeChange| {
        sink.lock().unwrap().push(change.clone());
    });

    signal.set(Appearance::Dark);
    signal.set(Appearance::Light);

    assert_eq!(root.attribute("data-theme"), Some("dark".into()));
    assert!(changes.lock().unwrap().is_empty());

    // Switching back to "system" picks up the latest cached preference
    engine.set_theme("system");
    assert_eq!(engine.resolved_theme(), Some("light".into()));
    assert_eq!(root.attribute("data-theme"), Some("light".into()));
}

#[test]
fn test_system_passes_through_verbatim_when_following_disabled() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Dark));

    let config = ThemeConfig {
        enable_system: false,
        ..ThemeConfig::default()
    };
    let engine = ThemeEngine::initialize(config, display_env(&storage, &root, &signal));

    engine.set_theme("system");
    assert_eq!(engine.resolved_theme(), Some("system".into()));
    assert_eq!(root.attribute("data-theme"), Some("system".into()));
}

#[test]
fn test_observers_fire_in_registration_order() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );

    let order = Arc::new(Mutex::new(Vec::new()));
    let first = order.clone();
    let second = order.clone();
    engine.subscribe(move |change: &ThemeChange| {
        first.lock().unwrap().push(("first", change.resolved.clone()));
    });
    let removed = engine.subscribe(move |change: &ThemeChange| {
        second.lock().unwrap().push(("second", change.resolved.clone()));
    });

    engine.set_theme("dark");
    assert_eq!(
        *order.lock().unwrap(),
        vec![
            ("first", Some("dark".to_string())),
            ("second", Some("dark".to_string())),
        ]
    );

    engine.unsubscribe(removed);
    order.lock().unwrap().clear();
    engine.set_theme("light");
    assert_eq!(
        *order.lock().unwrap(),
        vec![("first", Some("light".to_string()))]
    );
}

#[test]
fn test_dropping_the_handle_detaches_from_the_signal() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let handle = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );
    let engine = handle.engine().clone();
    assert_eq!(engine.resolved_theme(), Some("light".into()));

    drop(handle);
    signal.set(Appearance::Dark);
    // The cached preference no longer tracks the signal
    assert_eq!(engine.system_preference(), Some(Appearance::Light));
    assert_eq!(engine.resolved_theme(), Some("light".into()));
}

#[test]
fn test_setting_the_same_theme_twice_still_persists_each_call() {
    let storage = Arc::new(RecordingStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let engine = ThemeEngine::initialize(
        ThemeConfig::default(),
        display_env(&storage, &root, &signal),
    );

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    engine.subscribe(move |change: &ThemeChange| {
        sink.lock().unwrap().push(change.clone());
    });

    engine.set_theme("dark");
    engine.set_theme("dark");

    // Persistence is unconditional, notification is change-driven
    assert_eq!(storage.set_count(), 2);
    assert_eq!(changes.lock().unwrap().len(), 1);
}
