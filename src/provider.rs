//! Scoped theme distribution.
//!
//! A [`ThemeProvider`] owns one engine per scope and makes it reachable
//! through [`use_theme`]. Nesting short-circuits: installing a provider
//! while one is already in scope reuses the existing engine instead of
//! creating a second writer over the same storage key and document root.
//! With no provider in scope, [`use_theme`] returns the documented inert
//! bundle: reads report no value and writes are no-ops, never a crash.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ThemeConfig, ThemeName};
use crate::engine::{EngineHandle, ThemeEngine, ThemeEnvironment};

thread_local! {
    static CURRENT: RefCell<Option<Arc<ThemeEngine>>> = const { RefCell::new(None) };
}

fn current_engine() -> Option<Arc<ThemeEngine>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Scope owner for a theme engine. Dropping the owning provider uninstalls
/// the engine and stops its appearance subscription.
pub struct ThemeProvider {
    engine: Arc<ThemeEngine>,
    // None when this provider borrowed an enclosing provider's engine
    handle: Option<EngineHandle>,
}

impl ThemeProvider {
    /// Installs a provider for the current scope. If one is already in
    /// scope its engine is reused and `config`/`env` are ignored; the
    /// nested provider is a passthrough whose drop tears nothing down.
    pub fn install(config: ThemeConfig, env: ThemeEnvironment) -> ThemeProvider {
        if let Some(engine) = current_engine() {
            debug!("Theme provider already in scope, reusing its engine");
            return ThemeProvider {
                engine,
                handle: None,
            };
        }

        let handle = ThemeEngine::initialize(config, env);
        let engine = handle.engine().clone();
        CURRENT.with(|current| {
            *current.borrow_mut() = Some(engine.clone());
        });
        ThemeProvider {
            engine,
            handle: Some(handle),
        }
    }

    pub fn engine(&self) -> &Arc<ThemeEngine> {
        &self.engine
    }
}

impl Drop for ThemeProvider {
    fn drop(&mut self) {
        if self.handle.is_some() {
            CURRENT.with(|current| {
                *current.borrow_mut() = None;
            });
            // self.handle drops here, stopping the appearance subscription
        }
    }
}

/// The current scope's theme bundle: enumeration, the requested and
/// resolved theme, and the setters. Returns the inert default when no
/// provider is in scope.
pub fn use_theme() -> ThemeHandle {
    ThemeHandle {
        engine: current_engine(),
    }
}

/// Read/write bundle handed to consumers. Cheap to clone; all reads go
/// through the live engine.
#[derive(Clone, Default)]
pub struct ThemeHandle {
    engine: Option<Arc<ThemeEngine>>,
}

impl ThemeHandle {
    /// Available theme names; empty without a provider.
    pub fn themes(&self) -> Vec<ThemeName> {
        self.engine
            .as_ref()
            .map(|e| e.themes())
            .unwrap_or_default()
    }

    /// The requested theme; `None` without a provider.
    pub fn theme(&self) -> Option<ThemeName> {
        self.engine.as_ref().map(|e| e.requested_theme())
    }

    /// The resolved theme; `None` without a provider or before a "system"
    /// request has a preference to resolve against.
    pub fn resolved_theme(&self) -> Option<ThemeName> {
        self.engine.as_ref().and_then(|e| e.resolved_theme())
    }

    /// Sets the requested theme; a no-op without a provider.
    pub fn set_theme(&self, next: impl Into<ThemeName>) {
        if let Some(engine) = &self.engine {
            engine.set_theme(next);
        }
    }

    /// Closure form of [`ThemeHandle::set_theme`]; a no-op without a
    /// provider.
    pub fn update_theme(&self, update: impl FnOnce(&ThemeName) -> ThemeName) {
        if let Some(engine) = &self.engine {
            engine.update_theme(update);
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
