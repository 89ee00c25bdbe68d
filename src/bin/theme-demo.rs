//! Demo binary walking the theme engine end to end.
//!
//! Run with: cargo run --bin theme-demo
//!
//! This walks through:
//! 1. Provider installation over an in-memory display environment
//! 2. Initial resolution against the simulated OS preference
//! 3. An OS appearance flip while following "system"
//! 4. An explicit toggle (which stops the OS from mattering)
//! 5. What got persisted

use std::sync::Arc;

use anyhow::Result;
use theme_kit::{
    use_theme, Appearance, DocumentRoot, ManualSignal, MemoryStorage, ThemeConfig,
    ThemeEnvironment, ThemeProvider, VirtualRoot,
};

fn main() -> Result<()> {
    let _guard = theme_kit::logging::init();

    println!("=== theme-kit demo ===\n");

    println!("1. Installing provider (memory storage, virtual root, manual OS signal)...");
    let storage = Arc::new(MemoryStorage::new());
    let root = Arc::new(VirtualRoot::new());
    let signal = Arc::new(ManualSignal::new(Appearance::Light));

    let env = ThemeEnvironment::headless()
        .with_storage(storage.clone())
        .with_root(root.clone())
        .with_signal(signal.clone());
    let provider = ThemeProvider::install(ThemeConfig::default(), env);

    let theme = use_theme();
    print_state(&theme, &root);

    println!("\n2. OS switches to dark while following \"system\"...");
    signal.set(Appearance::Dark);
    print_state(&theme, &root);

    println!("\n3. Toggling explicitly (dark <-> light)...");
    theme.update_theme(|prev| {
        if prev == "dark" {
            "light".into()
        } else {
            "dark".into()
        }
    });
    print_state(&theme, &root);

    println!("\n4. OS flips back to light - ignored, the choice is explicit...");
    signal.set(Appearance::Light);
    print_state(&theme, &root);

    println!("\n5. Persisted choice:");
    use theme_kit::ThemeStorage;
    println!("   theme -> {:?}", storage.get("theme")?);

    drop(provider);
    println!("\nDone.");
    Ok(())
}

fn print_state(theme: &theme_kit::ThemeHandle, root: &Arc<VirtualRoot>) {
    println!("   requested -> {:?}", theme.theme());
    println!("   resolved  -> {:?}", theme.resolved_theme());
    println!("   root      -> data-theme={:?}", root.attribute("data-theme"));
}
