mod delete;
mod empty;
pub(crate) mod errors;
mod keep;
mod regex_replace;
mod replace;
pub mod uid;

use dicom_core::header::Header;
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{PrimitiveValue, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;
use garde::Validate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub use errors::ActionError;
pub use uid::RemapContext;

use crate::pseudonym::{self, CorrespondenceStore, CorrespondenceTable};
use crate::vr::{self, Rewrite};

/// Specifies the action to perform on a DICOM data element during de-identification.
///
/// The first seven variants are primitives. The remaining five are the conditional
/// actions of the DICOM basic profile (e.g. `X/Z`), which resolve to a fixed primitive.
#[derive(Validate, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// `D`: replace the value with a dummy value consistent with the VR.
    Replace,

    /// `Z`: replace the value with an empty (or null) value consistent with the VR.
    Empty,

    /// `X`: remove the data element. Dates are set to the null date instead.
    Delete,

    /// `U`: replace the value with a UID from the remap cache, whatever the VR.
    #[serde(rename = "replace_uid")]
    ReplaceUID,

    /// `K`: keep the value unchanged.
    Keep,

    /// Replace every match of `find` in the textual value with `replace`.
    RegexReplace {
        #[garde(custom(is_valid_regex))]
        find: String,
        #[garde(skip)]
        replace: String,
    },

    /// `P`: replace the patient ID and accession number with pseudonyms recorded
    /// in the correspondence table.
    #[serde(rename = "pseudonymize")]
    PseudonymizeWithCorrespondence,

    /// `Z/D`
    EmptyOrReplace,

    /// `X/Z`
    DeleteOrEmpty,

    /// `X/D`
    DeleteOrReplace,

    /// `X/Z/D`
    DeleteOrEmptyOrReplace,

    /// `X/Z/U*`
    #[serde(rename = "delete_or_empty_or_replace_uid")]
    DeleteOrEmptyOrReplaceUID,
}

fn is_valid_regex(value: &str, _ctx: &()) -> garde::Result {
    regex::Regex::new(value)
        .map(|_| ())
        .map_err(|err| garde::Error::new(format!("invalid regular expression: {err}")))
}

/// The primitive an [`Action`] resolves to for an element of a given VR.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Primitive<'a> {
    Replace,
    Empty,
    Delete,
    ReplaceUID,
    Keep,
    RegexReplace { find: &'a str, replace: &'a str },
    Pseudonymize,
}

/// Result of applying an action to a single tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tag is not present in the data set.
    NotFound,
    /// The tag was already written by the pseudonymize rule.
    Settled,
}

/// State shared by all action invocations of a batch.
#[derive(Debug, Default)]
pub struct ActionContext {
    pub remap: RemapContext,
    pub correspondence: Option<CorrespondenceStore>,
    /// Correspondence table with rows added by the current data set, not saved yet.
    pending: Option<CorrespondenceTable>,
}

impl ActionContext {
    pub fn new(correspondence: Option<CorrespondenceStore>) -> Self {
        Self {
            remap: RemapContext::new(),
            correspondence,
            pending: None,
        }
    }

    /// Returns `true` if pseudonyms were assigned that are not saved yet.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the correspondence rows that were not saved.
    pub fn discard_pending(&mut self) {
        if self.pending.take().is_some() {
            debug!("discarded unsaved correspondence rows");
        }
    }

    /// Saves the correspondence rows added since the last commit.
    pub fn commit(&mut self) -> Result<(), ActionError> {
        let Some(table) = self.pending.take() else {
            return Ok(());
        };
        let store = self
            .correspondence
            .as_ref()
            .ok_or(ActionError::MissingCorrespondenceTableConfig)?;
        store.save(&table)?;
        info!("saved {} correspondence(s) to {}", table.len(), store.path().display());
        Ok(())
    }
}

impl Action {
    fn resolve(&self, vr: VR) -> Primitive<'_> {
        match self {
            Action::Replace => Primitive::Replace,
            Action::Empty => Primitive::Empty,
            Action::Delete => Primitive::Delete,
            Action::ReplaceUID => Primitive::ReplaceUID,
            Action::Keep => Primitive::Keep,
            Action::RegexReplace { find, replace } => Primitive::RegexReplace { find, replace },
            Action::PseudonymizeWithCorrespondence => Primitive::Pseudonymize,
            Action::EmptyOrReplace => Primitive::Replace,
            Action::DeleteOrEmpty => Primitive::Empty,
            Action::DeleteOrReplace => Primitive::Replace,
            Action::DeleteOrEmptyOrReplace => Primitive::Replace,
            Action::DeleteOrEmptyOrReplaceUID if vr == VR::UI => Primitive::ReplaceUID,
            Action::DeleteOrEmptyOrReplaceUID => Primitive::Empty,
        }
    }

    pub fn is_pseudonymize(&self) -> bool {
        matches!(self, Action::PseudonymizeWithCorrespondence)
    }

    /// Applies the action to the element with the given tag, in place.
    ///
    /// A missing element is not an error, the outcome is then
    /// `Skipped(SkipReason::NotFound)`.
    pub fn apply(
        &self,
        obj: &mut InMemDicomObject,
        tag: Tag,
        ctx: &mut ActionContext,
    ) -> Result<Outcome, ActionError> {
        if self.is_pseudonymize() {
            return pseudonym::pseudonymize_deferred(
                obj,
                tag,
                ctx.correspondence.as_ref(),
                &mut ctx.pending,
            );
        }

        let elem = match obj.element_opt(tag)? {
            Some(elem) => elem,
            None => return Ok(Outcome::Skipped(SkipReason::NotFound)),
        };

        let change = match self.process_element(elem, &mut ctx.remap)? {
            None => Some(None),
            Some(Cow::Owned(new_elem)) => Some(Some(new_elem)),
            Some(Cow::Borrowed(_)) => None,
        };

        match change {
            Some(Some(new_elem)) => {
                obj.put(new_elem);
            }
            Some(None) => {
                obj.remove_element(tag);
            }
            None => {}
        }
        Ok(Outcome::Applied)
    }

    /// Processes a single element and returns its replacement.
    ///
    /// # Returns
    ///
    /// * `Some(Cow::Borrowed)` - the element is left as it is
    /// * `Some(Cow::Owned)` - the element is replaced
    /// * `None` - the element is removed
    pub fn process_element<'a>(
        &self,
        elem: &'a InMemElement,
        remap: &mut RemapContext,
    ) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
        match self.resolve(elem.vr()) {
            Primitive::Replace => replace::replace_element(elem, remap),
            Primitive::Empty => empty::empty_element(elem),
            Primitive::Delete => delete::delete_element(elem),
            Primitive::ReplaceUID => uid::replace_uid_element(elem, remap),
            Primitive::Keep => Ok(keep::keep_element(elem)),
            Primitive::RegexReplace { find, replace } => {
                regex_replace::regex_replace_element(elem, find, replace)
            }
            // works on the data set as a whole, see `apply`
            Primitive::Pseudonymize => Ok(Some(Cow::Borrowed(elem))),
        }
    }
}

pub(crate) fn is_empty_element(elem: &InMemElement) -> bool {
    elem.value() == &Value::Primitive(PrimitiveValue::Empty)
}

/// Applies a VR rewrite to a non-sequence element.
fn rewrite_element<'a>(
    elem: &'a InMemElement,
    rewrite: Rewrite,
    remap: &mut RemapContext,
) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
    let new_value = match rewrite {
        Rewrite::Unchanged => return Ok(Some(Cow::Borrowed(elem))),
        Rewrite::RemapUid => return uid::replace_uid_element(elem, remap),
        Rewrite::Text("") => PrimitiveValue::Empty,
        Rewrite::Text(text) => PrimitiveValue::from(text),
        Rewrite::Zero => vr::zero(elem.vr()).ok_or(ActionError::UnsupportedVR {
            tag: elem.tag(),
            vr: elem.vr(),
        })?,
        Rewrite::Recurse => {
            return Err(ActionError::InvalidValue(format!(
                "element {} is not a sequence",
                elem.tag()
            )))
        }
    };
    Ok(Some(Cow::Owned(InMemElement::new(
        elem.tag(),
        elem.vr(),
        new_value,
    ))))
}

/// Rebuilds a sequence element by passing every element of every item through `f`.
///
/// Elements for which `f` returns `None` are dropped from their item.
fn map_items<F>(elem: &InMemElement, mut f: F) -> Result<InMemElement, ActionError>
where
    F: FnMut(&InMemElement) -> Result<Option<InMemElement>, ActionError>,
{
    let Some(items) = elem.items() else {
        return Ok(elem.clone());
    };

    let mut new_items = Vec::with_capacity(items.len());
    for item in items {
        let mut elements = Vec::new();
        for sub_elem in item.iter() {
            if let Some(new_sub_elem) = f(sub_elem)? {
                elements.push(new_sub_elem);
            }
        }
        new_items.push(InMemDicomObject::from_element_iter(elements));
    }

    Ok(InMemElement::new(
        elem.tag(),
        VR::SQ,
        DataSetSequence::from(new_items),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_resolve_composites() {
        assert_eq!(Action::EmptyOrReplace.resolve(VR::PN), Primitive::Replace);
        assert_eq!(Action::DeleteOrEmpty.resolve(VR::PN), Primitive::Empty);
        assert_eq!(Action::DeleteOrReplace.resolve(VR::PN), Primitive::Replace);
        assert_eq!(Action::DeleteOrEmptyOrReplace.resolve(VR::PN), Primitive::Replace);
        assert_eq!(
            Action::DeleteOrEmptyOrReplaceUID.resolve(VR::UI),
            Primitive::ReplaceUID
        );
        assert_eq!(
            Action::DeleteOrEmptyOrReplaceUID.resolve(VR::SQ),
            Primitive::Empty
        );
    }

    #[test]
    fn test_apply_missing_element_is_skipped() {
        let mut obj = InMemDicomObject::new_empty();
        let mut ctx = ActionContext::default();
        let outcome = Action::Replace
            .apply(&mut obj, tags::PATIENT_NAME, &mut ctx)
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NotFound));
    }

    #[test]
    fn test_apply_replace() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            Value::from("Jane Doe"),
        ));
        let mut ctx = ActionContext::default();
        let outcome = Action::Replace
            .apply(&mut obj, tags::PATIENT_NAME, &mut ctx)
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(
            obj.element(tags::PATIENT_NAME).unwrap().to_str().unwrap(),
            vr::DUMMY_TEXT
        );
    }

    #[test]
    fn test_apply_delete() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            Value::from("Jane Doe"),
        ));
        let mut ctx = ActionContext::default();
        Action::Delete
            .apply(&mut obj, tags::PATIENT_NAME, &mut ctx)
            .unwrap();
        assert!(obj.element_opt(tags::PATIENT_NAME).unwrap().is_none());
    }

    #[test]
    fn test_apply_keep() {
        let mut obj = InMemDicomObject::new_empty();
        let elem = InMemElement::new(tags::PATIENT_NAME, VR::PN, Value::from("Jane Doe"));
        obj.put(elem.clone());
        let mut ctx = ActionContext::default();
        Action::Keep
            .apply(&mut obj, tags::PATIENT_NAME, &mut ctx)
            .unwrap();
        assert_eq!(obj.element(tags::PATIENT_NAME).unwrap(), &elem);
    }

    #[test]
    fn test_apply_unsupported_vr() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            tags::PATIENT_WEIGHT,
            VR::DS,
            Value::from("72.5"),
        ));
        let mut ctx = ActionContext::default();
        let result = Action::Replace.apply(&mut obj, tags::PATIENT_WEIGHT, &mut ctx);
        assert_eq!(
            result,
            Err(ActionError::UnsupportedVR {
                tag: tags::PATIENT_WEIGHT,
                vr: VR::DS
            })
        );
        // the element must not have been touched
        assert_eq!(
            obj.element(tags::PATIENT_WEIGHT).unwrap().to_str().unwrap(),
            "72.5"
        );
    }

    #[test]
    fn test_apply_pseudonymize_without_table() {
        let mut obj = InMemDicomObject::new_empty();
        let mut ctx = ActionContext::default();
        let result =
            Action::PseudonymizeWithCorrespondence.apply(&mut obj, tags::PATIENT_ID, &mut ctx);
        assert_eq!(result, Err(ActionError::MissingCorrespondenceTableConfig));
    }

    #[test]
    fn test_apply_pseudonymize_saves_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.csv");
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            tags::PATIENT_ID,
            VR::LO,
            Value::from("PAT001"),
        ));
        let mut ctx = ActionContext::new(Some(CorrespondenceStore::new(&path)));

        let outcome = Action::PseudonymizeWithCorrespondence
            .apply(&mut obj, tags::PATIENT_ID, &mut ctx)
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(ctx.has_pending());
        assert!(!path.exists());

        ctx.commit().unwrap();
        assert!(!ctx.has_pending());
        let table = CorrespondenceStore::new(&path).load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.patient("PAT001"),
            Some(obj.element(tags::PATIENT_ID).unwrap().to_str().unwrap().as_ref())
        );
    }

    #[test]
    fn test_discard_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.csv");
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            tags::PATIENT_ID,
            VR::LO,
            Value::from("PAT001"),
        ));
        let mut ctx = ActionContext::new(Some(CorrespondenceStore::new(&path)));

        Action::PseudonymizeWithCorrespondence
            .apply(&mut obj, tags::PATIENT_ID, &mut ctx)
            .unwrap();
        ctx.discard_pending();
        ctx.commit().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_validate_regex() {
        let valid = Action::RegexReplace {
            find: "^(\\d+)$".into(),
            replace: "X$1".into(),
        };
        assert!(valid.validate().is_ok());

        let invalid = Action::RegexReplace {
            find: "(".into(),
            replace: "".into(),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&Action::ReplaceUID).unwrap();
        assert_eq!(json, r#"{"action":"replace_uid"}"#);

        let json = serde_json::to_string(&Action::DeleteOrEmptyOrReplaceUID).unwrap();
        assert_eq!(json, r#"{"action":"delete_or_empty_or_replace_uid"}"#);

        let action: Action =
            serde_json::from_str(r#"{"action":"regex_replace","find":"a","replace":"b"}"#)
                .unwrap();
        assert_eq!(
            action,
            Action::RegexReplace {
                find: "a".into(),
                replace: "b".into()
            }
        );

        let action: Action = serde_json::from_str(r#"{"action":"pseudonymize"}"#).unwrap();
        assert_eq!(action, Action::PseudonymizeWithCorrespondence);
    }
}
