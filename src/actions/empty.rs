use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use super::errors::ActionError;
use super::uid::RemapContext;
use super::{map_items, rewrite_element};
use crate::vr::{self, Rewrite};

/// Replaces the element value with an empty value, or a null value for dates and times.
pub(crate) fn empty_element(
    elem: &InMemElement,
) -> Result<Option<Cow<'_, InMemElement>>, ActionError> {
    let rewrite = vr::emptied(elem.vr()).ok_or(ActionError::UnsupportedVR {
        tag: elem.tag(),
        vr: elem.vr(),
    })?;

    if rewrite == Rewrite::Recurse {
        let new_elem = map_items(elem, |sub_elem| {
            Ok(empty_element(sub_elem)?.map(Cow::into_owned))
        })?;
        return Ok(Some(Cow::Owned(new_elem)));
    }

    // the empty table never asks for a UID remap
    rewrite_element(elem, rewrite, &mut RemapContext::new())
}
