//! theme-kit - theme-state management for interactive applications
//!
//! Tracks a user-selected or system-inferred display theme, persists the
//! explicit choice, reconciles it with the operating system's color-scheme
//! preference, and reflects the resolved value onto the document root so
//! the rendering layer can react to it. Works the same with a full display
//! environment or headless (no storage, no root, no OS signal).
//!
//! # Quick start
//!
//! ```rust,ignore
//! use theme_kit::{use_theme, ThemeConfig, ThemeEnvironment, ThemeProvider};
//!
//! let _provider = ThemeProvider::install(ThemeConfig::default(), ThemeEnvironment::desktop());
//!
//! let theme = use_theme();
//! theme.set_theme("dark");
//! assert_eq!(theme.resolved_theme().as_deref(), Some("dark"));
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod logging;
pub mod provider;
pub mod storage;
pub mod system;

pub use config::{ThemeAttribute, ThemeConfig, ThemeName, SYSTEM_THEME};
pub use dom::{DocumentRoot, VirtualRoot};
pub use engine::{resolve, EngineHandle, ThemeChange, ThemeEngine, ThemeEnvironment};
pub use error::{Result, ResultExt, ThemeKitError};
pub use provider::{use_theme, ThemeHandle, ThemeProvider};
pub use storage::{FileStorage, MemoryStorage, ThemeStorage};
pub use system::{
    Appearance, AppearanceBridge, AppearanceSignal, AppearanceSubscription, ManualSignal,
    PolledAppearanceSignal,
};
