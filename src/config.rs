use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "registrard.toml";

/// When a rollover moves classes up the class-year ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassYearAdvance {
    /// Only when the new term starts a new academic year (term "1").
    NewYear,
    EveryTerm,
}

/// Per-workspace settings read from `registrard.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_late_after_minutes: i64,
    pub allocation_retries: u32,
    pub class_year_advance: ClassYearAdvance,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_late_after_minutes: 15,
            allocation_retries: 3,
            class_year_advance: ClassYearAdvance::NewYear,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = toml::from_str(raw)?;
        if cfg.allocation_retries == 0 {
            anyhow::bail!("allocation_retries must be at least 1");
        }
        if cfg.default_late_after_minutes < 0 {
            anyhow::bail!("default_late_after_minutes must not be negative");
        }
        Ok(cfg)
    }

    /// Missing file means defaults; a present but malformed file is an error.
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml_str("").expect("parse");
        assert_eq!(cfg.default_late_after_minutes, 15);
        assert_eq!(cfg.allocation_retries, 3);
        assert_eq!(cfg.class_year_advance, ClassYearAdvance::NewYear);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_toml_str(
            "default_late_after_minutes = 5\nallocation_retries = 7\nclass_year_advance = \"every_term\"\n",
        )
        .expect("parse");
        assert_eq!(cfg.default_late_after_minutes, 5);
        assert_eq!(cfg.allocation_retries, 7);
        assert_eq!(cfg.class_year_advance, ClassYearAdvance::EveryTerm);
    }

    #[test]
    fn zero_retries_is_rejected() {
        assert!(Config::from_toml_str("allocation_retries = 0").is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load(dir.path()).expect("load");
        assert_eq!(cfg.allocation_retries, 3);
    }
}
