//! Document-root collaborator.
//!
//! The engine writes the resolved theme onto a root element as a class
//! toggle or an attribute. The root is abstract: a real UI layer adapts its
//! own root widget/element behind [`DocumentRoot`]; [`VirtualRoot`] is the
//! in-memory implementation used by desktop shells and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Class-list and attribute surface of the rendered document's root.
pub trait DocumentRoot: Send + Sync {
    fn add_class(&self, name: &str);
    fn remove_class(&self, name: &str);
    fn has_class(&self, name: &str) -> bool;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);
    fn attribute(&self, name: &str) -> Option<String>;
}

#[derive(Default)]
struct RootState {
    classes: Vec<String>, // ordered, no duplicates
    attributes: BTreeMap<String, String>,
}

/// In-memory document root.
#[derive(Default)]
pub struct VirtualRoot {
    state: Mutex<RootState>,
}

impl VirtualRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current class list, in insertion order.
    pub fn classes(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.classes.clone())
            .unwrap_or_default()
    }
}

impl DocumentRoot for VirtualRoot {
    fn add_class(&self, name: &str) {
        if let Ok(mut state) = self.state.lock() {
            if !state.classes.iter().any(|c| c == name) {
                state.classes.push(name.to_string());
            }
        }
    }

    fn remove_class(&self, name: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.classes.retain(|c| c != name);
        }
    }

    fn has_class(&self, name: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.classes.iter().any(|c| c == name))
            .unwrap_or(false)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.attributes.remove(name);
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.attributes.get(name).cloned())
    }
}
