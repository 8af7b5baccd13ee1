//! Value representation tables used by the rewriting actions.

use dicom_core::{PrimitiveValue, VR};

pub const NULL_DATE: &str = "00010101";
pub const NULL_TIME: &str = "000000.00";
pub const NULL_DATE_TIME: &str = "00010101010101.000000+0000";
pub const DUMMY_TEXT: &str = "Anonymized";

/// How a value of a given VR is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Replace with a fixed text value.
    Text(&'static str),
    /// Replace with a single numeric zero of the element's VR.
    Zero,
    /// Replace through the UID remap cache.
    RemapUid,
    /// Leave the value as it is.
    Unchanged,
    /// Apply the same rewrite to every element of every sequence item.
    Recurse,
}

/// Rewrite used by the "replace with dummy value" action.
///
/// Returns `None` for VRs without a known safe dummy value.
pub fn replacement(vr: VR) -> Option<Rewrite> {
    match vr {
        VR::DA => Some(Rewrite::Text(NULL_DATE)),
        VR::TM => Some(Rewrite::Text(NULL_TIME)),
        VR::DT => Some(Rewrite::Text(NULL_DATE_TIME)),
        VR::LO | VR::SH | VR::PN | VR::CS => Some(Rewrite::Text(DUMMY_TEXT)),
        VR::UI => Some(Rewrite::RemapUid),
        VR::UL => Some(Rewrite::Unchanged),
        VR::IS => Some(Rewrite::Text("0")),
        VR::FD | VR::FL | VR::SS | VR::US => Some(Rewrite::Zero),
        VR::ST => Some(Rewrite::Text("")),
        VR::SQ => Some(Rewrite::Recurse),
        _ => None,
    }
}

/// Rewrite used by the "empty" action.
///
/// Text VRs become empty, the other VRs of [`replacement`] keep their dummy
/// value, UL is the only numeric VR set to zero. Returns `None` for VRs without
/// a known safe empty value.
pub fn emptied(vr: VR) -> Option<Rewrite> {
    match vr {
        VR::SH | VR::PN | VR::UI | VR::LO | VR::CS => Some(Rewrite::Text("")),
        VR::DA => Some(Rewrite::Text(NULL_DATE)),
        VR::TM => Some(Rewrite::Text(NULL_TIME)),
        VR::DT => Some(Rewrite::Text(NULL_DATE_TIME)),
        VR::UL => Some(Rewrite::Zero),
        VR::IS => Some(Rewrite::Text("0")),
        VR::ST => Some(Rewrite::Text("")),
        VR::SQ => Some(Rewrite::Recurse),
        _ => None,
    }
}

/// Maximum value length in characters for textual VRs, if any.
pub fn max_length(vr: VR) -> Option<usize> {
    match vr {
        VR::AE | VR::CS | VR::SH | VR::DA | VR::TM => Some(16),
        VR::AS => Some(4),
        VR::DS => Some(16),
        VR::DT => Some(26),
        VR::IS => Some(12),
        VR::LO | VR::UI | VR::PN => Some(64),
        VR::ST => Some(1024),
        VR::LT => Some(10240),
        _ => None,
    }
}

/// Numeric zero for binary numeric VRs, `None` for every other VR.
pub fn zero(vr: VR) -> Option<PrimitiveValue> {
    match vr {
        VR::FD => Some(PrimitiveValue::F64(vec![0.0_f64].into())),
        VR::FL => Some(PrimitiveValue::F32(vec![0.0_f32].into())),
        VR::SS => Some(PrimitiveValue::I16(vec![0_i16].into())),
        VR::US => Some(PrimitiveValue::U16(vec![0_u16].into())),
        VR::SL => Some(PrimitiveValue::I32(vec![0_i32].into())),
        VR::UL => Some(PrimitiveValue::U32(vec![0_u32].into())),
        _ => None,
    }
}

fn parse_all<T: std::str::FromStr>(text: &str) -> Option<Vec<T>> {
    text.split('\\').map(|v| v.trim().parse().ok()).collect()
}

/// Converts rewritten text back into a value matching the element's VR.
///
/// Binary numeric VRs are parsed (multiple values separated by `\`), every
/// other VR keeps the text as is. Returns `None` if the text does not parse.
pub fn text_to_value(vr: VR, text: &str) -> Option<PrimitiveValue> {
    let value = match vr {
        VR::FD => PrimitiveValue::F64(parse_all::<f64>(text)?.into()),
        VR::FL => PrimitiveValue::F32(parse_all::<f32>(text)?.into()),
        VR::SS => PrimitiveValue::I16(parse_all::<i16>(text)?.into()),
        VR::US => PrimitiveValue::U16(parse_all::<u16>(text)?.into()),
        VR::SL => PrimitiveValue::I32(parse_all::<i32>(text)?.into()),
        VR::UL => PrimitiveValue::U32(parse_all::<u32>(text)?.into()),
        VR::SV => PrimitiveValue::I64(parse_all::<i64>(text)?.into()),
        VR::UV => PrimitiveValue::U64(parse_all::<u64>(text)?.into()),
        _ => PrimitiveValue::from(text.to_owned()),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_dates_and_times() {
        assert_eq!(replacement(VR::DA), Some(Rewrite::Text(NULL_DATE)));
        assert_eq!(replacement(VR::TM), Some(Rewrite::Text(NULL_TIME)));
        assert_eq!(replacement(VR::DT), Some(Rewrite::Text(NULL_DATE_TIME)));
    }

    #[test]
    fn test_replacement_text_and_numbers() {
        for vr in [VR::LO, VR::SH, VR::PN, VR::CS] {
            assert_eq!(replacement(vr), Some(Rewrite::Text(DUMMY_TEXT)));
        }
        for vr in [VR::FD, VR::FL, VR::SS, VR::US] {
            assert_eq!(replacement(vr), Some(Rewrite::Zero));
        }
        assert_eq!(replacement(VR::IS), Some(Rewrite::Text("0")));
        assert_eq!(replacement(VR::ST), Some(Rewrite::Text("")));
        assert_eq!(replacement(VR::UL), Some(Rewrite::Unchanged));
        assert_eq!(replacement(VR::UI), Some(Rewrite::RemapUid));
        assert_eq!(replacement(VR::SQ), Some(Rewrite::Recurse));
    }

    #[test]
    fn test_replacement_unsupported() {
        assert_eq!(replacement(VR::DS), None);
        assert_eq!(replacement(VR::OB), None);
        assert_eq!(replacement(VR::LT), None);
    }

    #[test]
    fn test_emptied() {
        for vr in [VR::SH, VR::PN, VR::UI, VR::LO, VR::CS] {
            assert_eq!(emptied(vr), Some(Rewrite::Text("")));
        }
        assert_eq!(emptied(VR::DA), Some(Rewrite::Text(NULL_DATE)));
        assert_eq!(emptied(VR::DT), Some(Rewrite::Text(NULL_DATE_TIME)));
        assert_eq!(emptied(VR::UL), Some(Rewrite::Zero));
        assert_eq!(emptied(VR::IS), replacement(VR::IS));
        assert_eq!(emptied(VR::ST), replacement(VR::ST));
        assert_eq!(emptied(VR::SQ), Some(Rewrite::Recurse));
        assert_eq!(emptied(VR::US), None);
        assert_eq!(emptied(VR::DS), None);
    }

    #[test]
    fn test_max_length() {
        assert_eq!(max_length(VR::SH), Some(16));
        assert_eq!(max_length(VR::LO), Some(64));
        assert_eq!(max_length(VR::OB), None);
    }

    #[test]
    fn test_zero() {
        assert_eq!(zero(VR::US), Some(PrimitiveValue::U16(vec![0].into())));
        assert_eq!(zero(VR::FD), Some(PrimitiveValue::F64(vec![0.0].into())));
        assert_eq!(zero(VR::LO), None);
    }

    #[test]
    fn test_text_to_value() {
        assert_eq!(
            text_to_value(VR::US, "12\\13"),
            Some(PrimitiveValue::U16(vec![12, 13].into()))
        );
        assert_eq!(text_to_value(VR::US, "abc"), None);
        assert_eq!(
            text_to_value(VR::LO, "abc"),
            Some(PrimitiveValue::from("abc".to_owned()))
        );
    }
}
