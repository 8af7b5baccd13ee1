use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::StandardDataDictionary;
use garde::Validate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::actions::Action;
use crate::tag_pattern::TagPattern;

/// Mapping from tags and repeating groups of tags to the action applied to them.
///
/// Iteration yields exact tags first, in tag order, then repeating groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable(pub(crate) BTreeMap<TagPattern, Action>);

impl RuleTable {
    pub fn new() -> Self {
        RuleTable(BTreeMap::new())
    }

    pub fn insert(&mut self, pattern: impl Into<TagPattern>, action: Action) -> Option<Action> {
        self.0.insert(pattern.into(), action)
    }

    pub fn get(&self, pattern: &TagPattern) -> Option<&Action> {
        self.0.get(pattern)
    }

    /// Action for a single tag, if an exact rule exists for it.
    pub fn get_tag(&self, tag: Tag) -> Option<&Action> {
        self.0.get(&TagPattern::Exact(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagPattern, &Action)> {
        self.0.iter()
    }

    /// Returns `true` if any rule pseudonymizes, i.e. the table needs a correspondence table.
    pub fn needs_correspondence(&self) -> bool {
        self.0.values().any(Action::is_pseudonymize)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TagPattern, Action)> for RuleTable {
    fn from_iter<T: IntoIterator<Item = (TagPattern, Action)>>(iter: T) -> Self {
        RuleTable(iter.into_iter().collect())
    }
}

/// Combines two rule tables. Rules in `overrides` replace the rule for the same
/// tag or pattern in `base`, all other rules of `base` are kept.
pub fn merge(base: &RuleTable, overrides: &RuleTable) -> RuleTable {
    let mut merged = base.clone();
    for (pattern, action) in overrides.iter() {
        merged.0.insert(*pattern, action.clone());
    }
    merged
}

// Struct to hold the action and an optional comment
#[derive(Serialize)]
struct RuleWithComment<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'static str>,
    #[serde(flatten)]
    action: &'a Action,
}

// For deserialization, we need an owned version
#[derive(Deserialize)]
struct OwnedRuleWithComment {
    #[serde(default)]
    #[allow(dead_code)]
    comment: Option<String>,
    #[serde(flatten)]
    action: Action,
}

// Alias from the data dictionary, for exact tags and for repeating groups
// with a fixed element number like (60xx,3000)
fn get_alias(pattern: &TagPattern) -> Option<&'static str> {
    let tag = match pattern {
        TagPattern::Exact(tag) => *tag,
        TagPattern::Repeating(group) if group.element_mask == 0xFFFF => {
            Tag(group.group_bits, group.element_bits)
        }
        TagPattern::Repeating(_) => return None,
    };
    StandardDataDictionary.by_tag(tag).map(|entry| entry.alias)
}

impl Serialize for RuleTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for (pattern, action) in &self.0 {
            let rule = RuleWithComment {
                comment: get_alias(pattern),
                action,
            };
            map.serialize_entry(&pattern.to_string(), &rule)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_map: BTreeMap<String, OwnedRuleWithComment> =
            BTreeMap::deserialize(deserializer)?;

        let mut rules = BTreeMap::new();

        for (pattern_str, rule) in string_map {
            let pattern: TagPattern = pattern_str.parse().map_err(serde::de::Error::custom)?;

            rule.action.validate().map_err(|err| {
                serde::de::Error::custom(format!(
                    "Validation error for tag {}: {}",
                    pattern_str, err
                ))
            })?;

            // the comment is informative only
            rules.insert(pattern, rule.action);
        }

        Ok(RuleTable(rules))
    }
}
