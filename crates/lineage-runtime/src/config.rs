//! Realm and logging configuration

use lineage_events::INHERITED;

/// What `mixin` records when the same mixin is applied to an instance again
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicateMixins {
    /// Every application is recorded, duplicates included
    #[default]
    Append,
    /// A mixin is recorded once per instance; re-application still copies
    /// members and re-runs the initializer
    Ignore,
}

/// Realm configuration
#[derive(Clone, Debug)]
pub struct RealmConfig {
    /// Event triggered on a superclass by `inherit`
    pub inherited_event: String,
    /// Duplicate mixin policy
    pub duplicate_mixins: DuplicateMixins,
    /// Name given to the root constructor
    pub root_name: String,
}

impl Default for RealmConfig {
    fn default() -> Self {
        RealmConfig {
            inherited_event: INHERITED.to_string(),
            duplicate_mixins: DuplicateMixins::Append,
            root_name: "Object".to_string(),
        }
    }
}

impl RealmConfig {
    pub fn with_inherited_event(mut self, name: &str) -> Self {
        self.inherited_event = name.to_string();
        self
    }

    pub fn with_duplicate_mixins(mut self, policy: DuplicateMixins) -> Self {
        self.duplicate_mixins = policy;
        self
    }

    pub fn with_root_name(mut self, name: &str) -> Self {
        self.root_name = name.to_string();
        self
    }
}

/// Environment variable holding the tracing filter directive
pub const LOG_ENV: &str = "LINEAGE_LOG";
/// Environment variable switching log output to JSON (`1` or `true`)
pub const LOG_JSON_ENV: &str = "LINEAGE_LOG_JSON";

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `lineage_runtime=debug`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "warn".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Read `LINEAGE_LOG` and `LINEAGE_LOG_JSON`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(LOG_ENV).ok(),
            std::env::var(LOG_JSON_ENV).ok(),
        )
    }

    fn from_vars(filter: Option<String>, json: Option<String>) -> Self {
        let defaults = LogConfig::default();
        LogConfig {
            filter: filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.filter),
            json: json
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
                .unwrap_or(defaults.json),
        }
    }
}
