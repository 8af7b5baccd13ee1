use dicom_object::mem::InMemElement;
use std::borrow::Cow;

/// Leaves the element as it is, sequences included.
///
/// Combined with private tag removal, a keep rule is how a private tag survives.
pub(crate) fn keep_element(elem: &InMemElement) -> Option<Cow<'_, InMemElement>> {
    Some(Cow::Borrowed(elem))
}

#[cfg(test)]
mod tests {
    use super::*;

    use dicom_core::value::Value;
    use dicom_core::VR;

    use crate::tags;

    #[test]
    fn test_keep() {
        let elem = InMemElement::new(
            tags::ACCESSION_NUMBER,
            VR::SH,
            Value::from("0123456789ABCDEF"),
        );

        match keep_element(&elem) {
            Some(cow) => assert_eq!(cow.into_owned(), elem),
            _ => panic!("unexpected result"),
        }
    }
}
