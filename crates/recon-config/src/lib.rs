//! # recon-config
//!
//! Layered configuration loading for ehi-recon using figment.
//!
//! The configuration carries the domain decisions the engine must not make on
//! its own: which split tables make up a logical table and on which columns
//! they join, and how every child table relates to its parent.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RECON_*` prefix, `__` as separator)
//! 2. An explicit file passed by the caller
//! 3. Project-level `.recon/config.toml`
//! 4. User-level `~/.config/recon/config.toml`
//! 5. Bundled Epic EHI defaults (`defaults.toml`)
//!
//! Lists (`[[relationships.encounter]]`, `[[history]]`, ...) are replaced
//! wholesale by a higher layer, never appended to.
//!
//! # Usage
//!
//! ```no_run
//! use recon_config::ReconConfig;
//!
//! let config = ReconConfig::load().expect("config");
//! config.validate().expect("valid relationship classification");
//! println!("{} history timelines", config.history.len());
//! ```

mod encounters;
mod error;
mod general;
mod history;
mod lookups;
mod manifest;
mod relationships;
mod validate;

pub use encounters::{EncounterConfig, OrderConfig, OrderLinkConfig};
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use history::HistorySpec;
pub use lookups::{LookupSpec, ResolveSpec};
pub use manifest::{JoinAlias, ManifestConfig, SplitMember, SplitTable};
pub use relationships::{BridgeSpec, ChildSpec, CrossRefSpec, ProvenanceSpec, RelationshipConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bundled defaults for Epic EHI exports.
pub const BUNDLED_DEFAULTS: &str = include_str!("defaults.toml");

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub relationships: RelationshipConfig,
    #[serde(default)]
    pub encounters: EncounterConfig,
    #[serde(default)]
    pub orders: OrderConfig,
    #[serde(default)]
    pub history: Vec<HistorySpec>,
    #[serde(default)]
    pub lookups: Vec<LookupSpec>,
    #[serde(default)]
    pub resolve: Vec<ResolveSpec>,
}

impl ReconConfig {
    /// Load configuration from all sources (bundled defaults + TOML files +
    /// environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`ReconConfig::load_with_dotenv`] for
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed or
    /// extracted.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(None).extract().map_err(ConfigError::from)
    }

    /// Load configuration with an explicit config file layered above the
    /// project and user files.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the file does not exist and
    /// `ConfigError::Figment` if it cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::InvalidValue {
                field: "config".into(),
                reason: format!("file '{}' does not exist", path.display()),
            });
        }
        Self::figment(Some(path)).extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`ReconConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Only the bundled defaults, with no user, project, or environment
    /// layers. Used by tests and as the reference classification.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if the bundled file fails to extract.
    pub fn bundled() -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(BUNDLED_DEFAULTS))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(BUNDLED_DEFAULTS));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".recon/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("RECON_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("recon").join("config.toml"))
    }

    /// Every table the configuration may read, for existence reporting.
    #[must_use]
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = vec![
            self.general.patient_table.as_str(),
            self.encounters.table.as_str(),
            self.orders.table.as_str(),
            self.orders.results.table.as_str(),
            self.orders.links.table.as_str(),
        ];
        let specs = self
            .relationships
            .patient
            .iter()
            .chain(&self.relationships.encounter)
            .chain(&self.orders.children);
        for spec in specs {
            tables.push(&spec.table);
            if let Some(bridge) = &spec.bridge {
                tables.push(&bridge.table);
            }
        }
        tables.extend(self.history.iter().map(|h| h.table.as_str()));
        tables.extend(self.lookups.iter().map(|l| l.table.as_str()));
        tables.sort_unstable();
        tables.dedup();
        tables
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&LookupSpec> {
        self.lookups.iter().find(|l| l.name == name)
    }
}
