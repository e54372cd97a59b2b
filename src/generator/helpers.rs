//! Generator utility functions
//!
//! Path expansion and the interactive prompt used when saving a config.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen("~", &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

// ============================================================================
// User Prompts
// ============================================================================

/// Default name offered when saving: `Config_<unix seconds>`
pub fn default_config_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("Config_{}", secs)
}

/// Picks the name a bare `--save` stores the config under.
///
/// Prompts when `can_prompt` is set. Otherwise, or when the prompt fails,
/// the default `Config_<unix seconds>` name is used. Returns `None` only
/// when the user answers with an empty name.
pub fn choose_config_name(can_prompt: bool) -> Option<String> {
    if !can_prompt {
        let name = default_config_name();
        info!("No terminal to prompt on, saving config as '{}'", name);
        return Some(name);
    }
    prompt_config_name()
}

/// Ask for a name to save the generated config under
pub fn prompt_config_name() -> Option<String> {
    use dialoguer::{Input, theme::ColorfulTheme};

    let answer = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Save config as")
        .default(default_config_name())
        .interact_text();

    match answer {
        Ok(name) if !name.trim().is_empty() => {
            info!("Saving config as '{}'", name.trim());
            Some(name)
        }
        Ok(_) => None,
        Err(e) => {
            let name = default_config_name();
            warn!("Failed to read config name: {}, saving as '{}'", e, name);
            Some(name)
        }
    }
}
