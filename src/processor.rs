use dicom_core::header::Header;
use dicom_core::value::DataSetSequence;
use dicom_core::{Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;
use log::debug;
use std::collections::HashSet;
use thiserror::Error;

use crate::actions::{Action, ActionContext, ActionError, Outcome, SkipReason};
use crate::config::{Config, RuleTable};
use crate::private_tags::{self, PrivateTagSnapshot};
use crate::pseudonym;
use crate::tag_pattern::{RepeatingGroup, TagPattern};

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("rule for {pattern} failed: {source}")]
    Action {
        pattern: TagPattern,
        source: ActionError,
    },

    #[error("private tags could not be restored: {0}")]
    Private(ActionError),

    #[error("correspondence table could not be saved: {0}")]
    Correspondence(ActionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Counts of what happened to a data set during [`anonymize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Rules applied to at least one element.
    pub applied: usize,
    /// Exact-tag rules whose tag was absent or already settled.
    pub skipped: usize,
    /// Private elements removed in bulk.
    pub removed_private: usize,
    /// Private elements put back after the bulk removal.
    pub restored_private: usize,
}

pub trait Processor {
    fn process(&self, obj: &mut InMemDicomObject, ctx: &mut ActionContext) -> Result<Report>;
}

/// A processor that applies a [`RuleTable`] to whole data sets, including the
/// data sets nested in sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleProcessor {
    rules: RuleTable,
    delete_private_tags: bool,
}

impl RuleProcessor {
    pub fn new(rules: RuleTable, delete_private_tags: bool) -> Self {
        Self {
            rules,
            delete_private_tags,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rules().clone(), config.delete_private_tags())
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

impl Processor for RuleProcessor {
    fn process(&self, obj: &mut InMemDicomObject, ctx: &mut ActionContext) -> Result<Report> {
        anonymize(obj, &self.rules, ctx, self.delete_private_tags)
    }
}

fn action_error(pattern: &TagPattern) -> impl FnOnce(ActionError) -> Error + '_ {
    move |source| Error::Action {
        pattern: *pattern,
        source,
    }
}

/// De-identifies `obj` in place according to `rules`.
///
/// Rules are applied in this order:
///
/// 1. exact-tag `pseudonymize` rules
/// 2. every other exact-tag rule, in tag order; tags already written by a
///    `pseudonymize` rule are left alone
/// 3. repeating-group rules, on every matching element at any nesting level
/// 4. if `delete_private_tags` is set, removal of every private element,
///    after which the private elements with an exact-tag rule are put back
///
/// The first failing rule aborts the whole data set. New rows of the
/// correspondence table are saved only once every rule succeeded, so an
/// aborted data set leaves the table untouched.
pub fn anonymize(
    obj: &mut InMemDicomObject,
    rules: &RuleTable,
    ctx: &mut ActionContext,
    delete_private_tags: bool,
) -> Result<Report> {
    let mut report = Report::default();
    let mut snapshots: Vec<PrivateTagSnapshot> = Vec::new();
    let mut settled: HashSet<Tag> = HashSet::new();
    ctx.discard_pending();

    let exact_rules = rules.iter().filter_map(|(pattern, action)| match pattern {
        TagPattern::Exact(tag) => Some((pattern, *tag, action)),
        TagPattern::Repeating(_) => None,
    });
    let (pseudonymize_rules, other_rules): (Vec<_>, Vec<_>) =
        exact_rules.partition(|(_, _, action)| action.is_pseudonymize());

    for (pattern, tag, action) in pseudonymize_rules.into_iter().chain(other_rules) {
        let outcome = if settled.contains(&tag) {
            Outcome::Skipped(SkipReason::Settled)
        } else {
            action
                .apply(obj, tag, ctx)
                .map_err(action_error(pattern))?
        };
        debug!("{pattern} {action:?}: {outcome:?}");

        match outcome {
            Outcome::Applied => {
                report.applied += 1;
                if action.is_pseudonymize() {
                    settled.extend(pseudonym::written_tags(tag));
                }
            }
            Outcome::Skipped(_) => report.skipped += 1,
        }

        if delete_private_tags {
            if let Some(snapshot) =
                private_tags::capture(obj, tag).map_err(action_error(pattern))?
            {
                snapshots.push(snapshot);
            }
        }
    }

    for (pattern, action) in rules.iter() {
        let TagPattern::Repeating(group) = pattern else {
            continue;
        };
        let count =
            apply_repeating(obj, group, action, ctx).map_err(action_error(pattern))?;
        debug!("{pattern} {action:?}: {count} element(s)");
        if count > 0 {
            report.applied += 1;
        }
    }

    if delete_private_tags {
        report.removed_private = private_tags::remove_private_tags(obj);
        report.restored_private =
            private_tags::restore(obj, &snapshots).map_err(Error::Private)?;
    }

    ctx.commit().map_err(Error::Correspondence)?;
    debug!("{report:?}");
    Ok(report)
}

/// Applies `action` to every element matching `group`, in `obj` and in the items
/// of its sequences.
///
/// A sequence matched by the group is handled by the action itself and is not
/// searched again, so no element is processed twice.
fn apply_repeating(
    obj: &mut InMemDicomObject,
    group: &RepeatingGroup,
    action: &Action,
    ctx: &mut ActionContext,
) -> std::result::Result<usize, ActionError> {
    let matching: Vec<Tag> = obj
        .iter()
        .map(|elem| elem.tag())
        .filter(|tag| group.matches(tag))
        .collect();

    let mut count = 0;
    for tag in matching {
        if action.apply(obj, tag, ctx)? == Outcome::Applied {
            count += 1;
        }
    }

    let sequences: Vec<(Tag, Vec<InMemDicomObject>)> = obj
        .iter()
        .filter(|elem| !group.matches(&elem.tag()))
        .filter_map(|elem| elem.items().map(|items| (elem.tag(), items.to_vec())))
        .collect();

    for (tag, mut items) in sequences {
        let mut nested = 0;
        for item in items.iter_mut() {
            nested += apply_repeating(item, group, action, ctx)?;
        }
        if nested > 0 {
            obj.put(InMemElement::new(tag, VR::SQ, DataSetSequence::from(items)));
            count += nested;
        }
    }

    Ok(count)
}
