use dicom_core::header::Header;
use dicom_core::VR;
use dicom_object::mem::InMemElement;
use log::warn;
use regex::Regex;
use std::borrow::Cow;

use super::errors::ActionError;
use super::is_empty_element;
use crate::vr;

/// Replaces every match of `find` in the element value, coerced to text, with `replace`.
///
/// `replace` may refer to capture groups (`$1`, `${name}`).
pub(crate) fn regex_replace_element<'a>(
    elem: &'a InMemElement,
    find: &str,
    replace: &str,
) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
    if elem.vr() == VR::SQ {
        warn!(
            "cannot apply a regular expression to sequence {}, leaving it unchanged",
            elem.tag()
        );
        return Ok(Some(Cow::Borrowed(elem)));
    }
    if is_empty_element(elem) {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let re = Regex::new(find)?;
    let text = elem.to_str()?;
    let new_text = re.replace_all(&text, replace);
    if new_text == text {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let new_value = vr::text_to_value(elem.vr(), &new_text).ok_or_else(|| {
        ActionError::InvalidValue(format!(
            "replaced value {new_text} does not fit {} element {}",
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
