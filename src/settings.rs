//! Game settings and preferences
//!
//! Persisted inside the save snapshot (see `persistence::SaveSnapshot`).

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// All audio silenced
    pub muted: bool,
    /// CRT scanline overlay (presentation only)
    pub crt: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            crt: true,
        }
    }
}

impl Settings {
    /// Flip mute, returning the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Flip the CRT overlay, returning the new value
    pub fn toggle_crt(&mut self) -> bool {
        self.crt = !self.crt;
        self.crt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.muted);
        assert!(settings.crt);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"muted":true}"#).unwrap();
        assert!(settings.muted);
        assert!(settings.crt);
    }

    #[test]
    fn test_toggles() {
        let mut settings = Settings::default();
        assert!(settings.toggle_mute());
        assert!(!settings.toggle_crt());
        assert!(!settings.toggle_mute());
    }
}
