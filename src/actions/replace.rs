use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use super::errors::ActionError;
use super::uid::RemapContext;
use super::{map_items, rewrite_element};
use crate::vr::{self, Rewrite};

/// Replaces the element value with a dummy value consistent with its VR.
///
/// Sequences are not replaced themselves, every element nested in them is.
pub(crate) fn replace_element<'a>(
    elem: &'a InMemElement,
    remap: &mut RemapContext,
) -> Result<Option<Cow<'a, InMemElement>>, ActionError> {
    let rewrite = vr::replacement(elem.vr()).ok_or(ActionError::UnsupportedVR {
        tag: elem.tag(),
        vr: elem.vr(),
    })?;

    if rewrite == Rewrite::Recurse {
        let new_elem = map_items(elem, |sub_elem| {
            Ok(replace_element(sub_elem, remap)?.map(Cow::into_owned))
        })?;
        return Ok(Some(Cow::Owned(new_elem)));
    }

    rewrite_element(elem, rewrite, remap)
}

#[cfg(test)]
mod tests {
    use super::*;

    use dicom_core::value::{DataSetSequence, PrimitiveValue, Value};
    use dicom_core::{Tag, VR};
    use dicom_object::InMemDicomObject;

    use crate::tags;

    fn replaced(elem: &InMemElement) -> InMemElement {
        let mut remap = RemapContext::new();
        replace_element(elem, &mut remap)
            .unwrap()
            .unwrap()
            .into_owned()
    }

    #[test]
    fn test_replace_date() {
        let elem = InMemElement::new(tags::STUDY_DATE, VR::DA, Value::from("20010102"));
        assert_eq!(replaced(&elem).to_str().unwrap(), vr::NULL_DATE);
    }

    #[test]
    fn test_replace_time_and_date_time() {
        let elem = InMemElement::new(tags::STUDY_TIME, VR::TM, Value::from("101010"));
        assert_eq!(replaced(&elem).to_str().unwrap(), vr::NULL_TIME);

        let elem = InMemElement::new(
            tags::ACQUISITION_DATE_TIME,
            VR::DT,
            Value::from("20010102101010"),
        );
        assert_eq!(replaced(&elem).to_str().unwrap(), vr::NULL_DATE_TIME);
    }

    #[test]
    fn test_replace_person_name() {
        let elem = InMemElement::new(tags::PATIENT_NAME, VR::PN, Value::from("Jane Doe"));
        let new_elem = replaced(&elem);
        assert_eq!(new_elem.tag(), tags::PATIENT_NAME);
        assert_eq!(new_elem.vr(), VR::PN);
        assert_eq!(new_elem.to_str().unwrap(), "Anonymized");
    }

    #[test]
    fn test_replace_numbers() {
        let elem = InMemElement::new(
            Tag(0x0018, 0x1020),
            VR::US,
            PrimitiveValue::U16(vec![512].into()),
        );
        assert_eq!(
            replaced(&elem).value(),
            &Value::Primitive(PrimitiveValue::U16(vec![0].into()))
        );

        let elem = InMemElement::new(Tag(0x0020, 0x0012), VR::IS, Value::from("42"));
        assert_eq!(replaced(&elem).to_str().unwrap(), "0");
    }

    #[test]
    fn test_replace_unsigned_long_is_unchanged() {
        let elem = InMemElement::new(
            Tag(0x0018, 0x1242),
            VR::UL,
            PrimitiveValue::U32(vec![1234].into()),
        );
        let mut remap = RemapContext::new();
        let result = replace_element(&elem, &mut remap).unwrap().unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_replace_uid_is_stable() {
        let elem = InMemElement::new(
            tags::STUDY_INSTANCE_UID,
            VR::UI,
            Value::from("1.2.840.10008.1"),
        );
        let mut remap = RemapContext::new();
        let first = replace_element(&elem, &mut remap).unwrap().unwrap();
        let second = replace_element(&elem, &mut remap).unwrap().unwrap();
        assert_eq!(first.to_str().unwrap(), second.to_str().unwrap());
        assert_eq!(first.to_str().unwrap().len(), "1.2.840.10008.1".len());
    }

    #[test]
    fn test_replace_unsupported_vr() {
        let elem = InMemElement::new(tags::PATIENT_WEIGHT, VR::DS, Value::from("72.5"));
        let mut remap = RemapContext::new();
        let result = replace_element(&elem, &mut remap);
        assert_eq!(
            result,
            Err(ActionError::UnsupportedVR {
                tag: tags::PATIENT_WEIGHT,
                vr: VR::DS
            })
        );
    }

    #[test]
    fn test_replace_sequence_recurses() {
        let item = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::PATIENT_NAME, VR::PN, Value::from("Jane Doe")),
            InMemElement::new(tags::STUDY_DATE, VR::DA, Value::from("20010102")),
        ]);
        let elem = InMemElement::new(
            tags::REFERENCED_PATIENT_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        );

        let new_elem = replaced(&elem);
        let items = new_elem.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].element(tags::PATIENT_NAME).unwrap().to_str().unwrap(),
            "Anonymized"
        );
        assert_eq!(
            items[0].element(tags::STUDY_DATE).unwrap().to_str().unwrap(),
            vr::NULL_DATE
        );
    }

    #[test]
    fn test_replace_sequence_with_unsupported_nested_vr() {
        let item = InMemDicomObject::from_element_iter([InMemElement::new(
            tags::PATIENT_WEIGHT,
            VR::DS,
            Value::from("72.5"),
        )]);
        let elem = InMemElement::new(
            tags::REFERENCED_PATIENT_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        );
        let mut remap = RemapContext::new();
        assert!(replace_element(&elem, &mut remap).is_err());
    }
}
