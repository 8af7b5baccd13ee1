use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use log::debug;
use rand::Rng;
use std::borrow::Cow;
use std::collections::HashMap;

use super::errors::ActionError;
use super::is_empty_element;
use crate::vr;

/// Cache of replacement UIDs, shared by every file of a batch.
///
/// The same original UID always maps to the same replacement, so references
/// between objects (and between files processed together) stay consistent.
#[derive(Debug, Clone, Default)]
pub struct RemapContext {
    uids: HashMap<String, String>,
}

impl RemapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replacement for `uid`, generating one on first use.
    ///
    /// Trailing NUL and space padding is ignored. Every alphanumeric character
    /// is replaced by a random digit, every other character stays in place.
    pub fn remap(&mut self, uid: &str) -> String {
        let uid = uid.trim_end_matches(['\0', ' ']);
        if let Some(new_uid) = self.uids.get(uid) {
            return new_uid.clone();
        }

        let mut rng = rand::rng();
        let new_uid: String = uid
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    char::from(b'0' + rng.random_range(0..10u8))
                } else {
                    c
                }
            })
            .collect();

        debug!("new UID mapping: {uid} -> {new_uid}");
        self.uids.insert(uid.to_owned(), new_uid.clone());
        new_uid
    }

    /// Previously generated replacement for `uid`, if any.
    pub fn get(&self, uid: &str) -> Option<&str> {
        self.uids
            .get(uid.trim_end_matches(['\0', ' ']))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

/// Replaces every value of the element through the remap cache, whatever its VR.
pub(crate) fn replace_uid_element<'a>(
    elem: &'a InMemElement,
    remap: &mut RemapContext,
) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
    if is_empty_element(elem) {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let text = elem.to_str()?;
    let new_text = text
        .split('\\')
        .map(|uid| remap.remap(uid))
        .collect::<Vec<_>>()
        .join("\\");

    let new_value = vr::text_to_value(elem.vr(), &new_text).ok_or_else(|| {
        ActionError::InvalidValue(format!(
            "remapped value {new_text} does not fit {} element {}",
            elem.vr(),
            elem.tag()
        ))
    })?;

    Ok(Some(Cow::Owned(InMemElement::new(
        elem.tag(),
        elem.vr(),
        new_value,
    ))))
}
