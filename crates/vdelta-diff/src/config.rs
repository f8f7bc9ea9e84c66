use serde::{Deserialize, Serialize};

/// Configuration for a diff pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Character data of at most this many chars is always overwritten
    /// with `SetTextData` instead of being edited in place.
    pub short_text_len: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { short_text_len: 6 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DiffConfig::default();
        assert_eq!(c.short_text_len, 6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: DiffConfig = toml::from_str("").unwrap();
        assert_eq!(c, DiffConfig::default());

        let c: DiffConfig = toml::from_str("short_text_len = 12").unwrap();
        assert_eq!(c.short_text_len, 12);
    }
}
