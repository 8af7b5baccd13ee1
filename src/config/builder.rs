use dicom_core::Tag;
use std::path::PathBuf;

use super::{merge, Config, RuleTable};
use crate::actions::Action;
use crate::hashing::HashFn;
use crate::tag_pattern::TagPattern;

/// A builder for [`Config`].
///
/// [`ConfigBuilder::new`] starts from an empty rule table, [`ConfigBuilder::default`]
/// from the default profile.
///
/// # Example
///
/// ```
/// use dicom_pseudonymizer::actions::Action;
/// use dicom_pseudonymizer::config::ConfigBuilder;
/// use dicom_pseudonymizer::tags;
///
/// let config = ConfigBuilder::default()
///     .lookup_table("lookup.csv")
///     .tag_action(tags::INSTITUTION_NAME, Action::Keep)
///     .delete_private_tags(false)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder(Config::new(RuleTable::new()))
    }

    /// Sets a custom hash function for new pseudonyms.
    pub fn hash_fn(mut self, hash_fn: HashFn) -> Self {
        self.0.hash_fn = hash_fn;
        self
    }

    /// Sets the action for a single tag, or for a repeating group of tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use dicom_core::Tag;
    /// use dicom_pseudonymizer::actions::Action;
    /// use dicom_pseudonymizer::config::ConfigBuilder;
    /// use dicom_pseudonymizer::tag_pattern::RepeatingGroup;
    /// use dicom_pseudonymizer::tags;
    ///
    /// let config = ConfigBuilder::new()
    ///     // keep a private tag even though private tags are removed
    ///     .tag_action(Tag(0x0033, 0x1005), Action::Keep)
    ///     // replace the value with a dummy value
    ///     .tag_action(tags::PATIENT_NAME, Action::Replace)
    ///     // remove all overlay data
    ///     .tag_action(RepeatingGroup::new(0x6000, 0x3000, 0xFF00, 0xFFFF), Action::Delete)
    ///     .build();
    /// ```
    pub fn tag_action(mut self, pattern: impl Into<TagPattern>, action: Action) -> Self {
        self.0.rules.insert(pattern, action);
        self
    }

    /// Keeps the given tags unchanged.
    pub fn exclude(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        for tag in tags {
            self.0.rules.insert(tag, Action::Keep);
        }
        self
    }

    /// Replaces the rules of the configuration by the rules in `overrides` where
    /// they overlap.
    pub fn overrides(mut self, overrides: &RuleTable) -> Self {
        self.0.rules = merge(&self.0.rules, overrides);
        self
    }

    /// Controls whether private tags are removed.
    ///
    /// Private tags with an explicit rule are put back after the removal, under
    /// a block of the same private creator.
    pub fn delete_private_tags(mut self, delete: bool) -> Self {
        self.0.delete_private_tags = delete;
        self
    }

    /// Controls whether output files are named after the pseudonymized
    /// Patient ID and Accession Number.
    pub fn rename_output(mut self, rename: bool) -> Self {
        self.0.rename_output = rename;
        self
    }

    /// Sets the location of the correspondence table.
    pub fn lookup_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.0.lookup_table = Some(path.into());
        self
    }

    pub fn build(self) -> Config {
        self.0
    }
}

impl Default for ConfigBuilder {
    /// Creates a new `ConfigBuilder` with the default rule profile, removing
    /// private tags and keeping file names.
    fn default() -> Self {
        ConfigBuilder(Config::default())
    }
}
