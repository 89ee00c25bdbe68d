use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Theme names are opaque identifiers ("light", "dark", or anything the
/// application defines). The engine never checks that a name maps to real
/// styling.
pub type ThemeName = String;

/// Reserved theme name meaning "defer to the OS color-scheme preference".
pub const SYSTEM_THEME: &str = "system";

/// Default theme set
pub const DEFAULT_THEMES: [&str; 2] = ["light", "dark"];

/// Default storage key for the persisted theme choice
pub const DEFAULT_STORAGE_KEY: &str = "theme";

/// Default document-root attribute the resolved theme is written to
pub const DEFAULT_ATTRIBUTE: &str = "data-theme";

/// How the resolved theme lands on the document root: toggled as a CSS
/// class, or written to a named attribute (`data-theme`, `data-mode`, ...).
///
/// Serialized as its plain string form; `"class"` is the sentinel, any
/// other string is treated as an attribute name verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThemeAttribute {
    Class,
    Data(String),
}

impl ThemeAttribute {
    pub fn as_str(&self) -> &str {
        match self {
            ThemeAttribute::Class => "class",
            ThemeAttribute::Data(name) => name,
        }
    }
}

impl Default for ThemeAttribute {
    fn default() -> Self {
        ThemeAttribute::Data(DEFAULT_ATTRIBUTE.to_string())
    }
}

impl From<&str> for ThemeAttribute {
    fn from(value: &str) -> Self {
        match value {
            "class" => ThemeAttribute::Class,
            other => ThemeAttribute::Data(other.to_string()),
        }
    }
}

impl From<String> for ThemeAttribute {
    fn from(value: String) -> Self {
        ThemeAttribute::from(value.as_str())
    }
}

impl From<ThemeAttribute> for String {
    fn from(value: ThemeAttribute) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for ThemeAttribute {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ThemeAttribute::from(s))
    }
}

impl fmt::Display for ThemeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-wide theme configuration. Constructed once and handed to the
/// engine; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// All theme names the application offers. Only used for enumeration
    /// and for cleaning stale classes off the document root.
    #[serde(default = "default_themes")]
    pub themes: Vec<ThemeName>,
    /// Whether "system" is a meaningful request and OS preference changes
    /// are tracked at all.
    #[serde(default = "default_enable_system", rename = "enableSystem")]
    pub enable_system: bool,
    /// Key the requested theme is persisted under.
    #[serde(default = "default_storage_key", rename = "storageKey")]
    pub storage_key: String,
    /// Theme used when nothing is persisted. When unset, falls back to
    /// "system" if system-following is enabled, "light" otherwise (see
    /// [`ThemeConfig::fallback_theme`]).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "defaultTheme"
    )]
    pub default_theme: Option<ThemeName>,
    /// Where the resolved theme is written on the document root.
    #[serde(default)]
    pub attribute: ThemeAttribute,
}

fn default_themes() -> Vec<ThemeName> {
    DEFAULT_THEMES.iter().map(|t| t.to_string()).collect()
}

fn default_enable_system() -> bool {
    true
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            themes: default_themes(),
            enable_system: true,
            storage_key: default_storage_key(),
            default_theme: None, // resolved per enable_system via fallback_theme()
            attribute: ThemeAttribute::default(),
        }
    }
}

impl ThemeConfig {
    /// The theme used when storage has no value for the configured key.
    pub fn fallback_theme(&self) -> ThemeName {
        match &self.default_theme {
            Some(theme) => theme.clone(),
            None if self.enable_system => SYSTEM_THEME.to_string(),
            None => "light".to_string(),
        }
    }
}
