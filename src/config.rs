//! Layered configuration.
//!
//! Sources, later ones win:
//! - built-in defaults
//! - `barcode-catalog.toml` in the current directory (or `--config FILE`)
//! - environment variables prefixed with `BC_`, double underscore between
//!   levels: `BC_INGEST__STRICT=true`, `BC_LOGGING__DEFAULT=debug`
//!
//! ```toml
//! [ingest]
//! strict = false
//! warn_unsupported_cells = false
//!
//! [logging]
//! default = "warn"
//! file = "barcode-catalog.log"
//!
//! [logging.modules]
//! barcode_catalog = "info"   # default; "warn" hides the load messages
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::parser::IngestOptions;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "barcode-catalog.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "BC_";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Price policy used by every ingestion
    #[serde(default)]
    pub ingest: IngestOptions,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for everything not listed in `modules`
    #[serde(default = "default_level")]
    pub default: String,

    /// Per-target overrides, e.g. `barcode_catalog::parser = "debug"`
    #[serde(default = "default_modules")]
    pub modules: HashMap<String, String>,

    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "warn".to_string()
}

/// The crate's own `info` events (selected file, catalog size) show by default
fn default_modules() -> HashMap<String, String> {
    HashMap::from([("barcode_catalog".to_string(), "info".to_string())])
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_level(),
            modules: default_modules(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Filter directive string for `EnvFilter`
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();

        let mut filter = self.default.clone();
        for (module, level) in modules {
            filter.push_str(&format!(",{module}={level}"));
        }
        filter
    }
}

impl Settings {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// A missing config file is not an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }
}
