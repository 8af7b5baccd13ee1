use dicom_core::header::Header;
use dicom_core::{PrimitiveValue, VR};
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use super::errors::ActionError;
use super::map_items;
use crate::vr::NULL_DATE;

/// Removes the element.
///
/// Dates are set to the null date instead of being removed, and sequences keep
/// their items while the deletion is applied to every nested element.
pub(crate) fn delete_element(
    elem: &InMemElement,
) -> Result<Option<Cow<'_, InMemElement>>, ActionError> {
    match elem.vr() {
        VR::DA => Ok(Some(Cow::Owned(InMemElement::new(
            elem.tag(),
            VR::DA,
            PrimitiveValue::from(NULL_DATE),
        )))),
        VR::SQ => {
            let new_elem = map_items(elem, |sub_elem| {
                Ok(delete_element(sub_elem)?.map(Cow::into_owned))
            })?;
            Ok(Some(Cow::Owned(new_elem)))
        }
        _ => Ok(None),
    }
}
