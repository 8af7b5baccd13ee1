pub mod builder;
pub mod profile;
pub mod rule_table;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hashing::{blake3_hash_fn, HashFn};

pub use builder::ConfigBuilder;
pub use profile::build_default_table;
pub use rule_table::{merge, RuleTable};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid rules in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_true() -> bool {
    true
}

pub fn default_hash_fn() -> HashFn {
    blake3_hash_fn
}

/// Configuration for DICOM pseudonymization.
///
/// # Fields
///
/// * `hash_fn` - The hash function used to derive new pseudonyms
/// * `delete_private_tags` - Whether private tags are removed, except the ones with an explicit rule
/// * `rename_output` - Whether output files are named after the pseudonymized patient and accession
/// * `lookup_table` - Location of the correspondence table, needed by the pseudonymize action
/// * `rules` - Mapping of tags and repeating groups to their de-identification actions
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(skip, default = "default_hash_fn")]
    hash_fn: HashFn,

    #[serde(default = "default_true")]
    delete_private_tags: bool,

    #[serde(default)]
    rename_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    lookup_table: Option<PathBuf>,

    #[serde(default = "RuleTable::default")]
    rules: RuleTable,
}

impl Config {
    fn new(rules: RuleTable) -> Self {
        Self {
            hash_fn: blake3_hash_fn,
            delete_private_tags: true,
            rename_output: false,
            lookup_table: None,
            rules,
        }
    }

    pub fn get_hash_fn(&self) -> HashFn {
        self.hash_fn
    }

    pub fn delete_private_tags(&self) -> bool {
        self.delete_private_tags
    }

    pub fn rename_output(&self) -> bool {
        self.rename_output
    }

    pub fn lookup_table(&self) -> Option<&Path> {
        self.lookup_table.as_deref()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

impl Default for Config {
    /// A configuration with the default rule profile.
    fn default() -> Self {
        Self::new(build_default_table())
    }
}

/// Reads a JSON file of rules.
///
/// The file holds either a bare rule map, in the same format as the `rules` of
/// a [`Config`], or a whole serialized [`Config`] (as printed by `cfgdump`), in
/// which case only its `rules` are used.
pub fn load_rules(path: &Path) -> Result<RuleTable, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut value: serde_json::Value = serde_json::from_str(&content).map_err(parse_error)?;
    let rules = match value.get_mut("rules").map(serde_json::Value::take) {
        Some(rules) => rules,
        None => value,
    };
    serde_json::from_value(rules).map_err(parse_error)
}
