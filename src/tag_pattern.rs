use dicom_core::Tag;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("invalid tag pattern: {0}")]
pub struct TagPatternError(String);

/// Returns `true` for tags with an odd group number, i.e. private tags.
pub fn is_private_tag(tag: &Tag) -> bool {
    tag.group() % 2 != 0
}

/// A "repeating group" of standard tags, e.g. the overlay planes `(60xx,3000)`.
///
/// A tag matches when `group & group_mask == group_bits` and
/// `element & element_mask == element_bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepeatingGroup {
    pub group_bits: u16,
    pub element_bits: u16,
    pub group_mask: u16,
    pub element_mask: u16,
}

impl RepeatingGroup {
    pub const fn new(group_bits: u16, element_bits: u16, group_mask: u16, element_mask: u16) -> Self {
        Self {
            group_bits,
            element_bits,
            group_mask,
            element_mask,
        }
    }

    pub fn matches(&self, tag: &Tag) -> bool {
        tag.group() & self.group_mask == self.group_bits
            && tag.element() & self.element_mask == self.element_bits
    }

    fn is_nibble_aligned(&self) -> bool {
        let aligned = |mask: u16, bits: u16| {
            (0..4).all(|i| {
                let nibble = (mask >> (i * 4)) & 0xF;
                (nibble == 0xF || nibble == 0) && (bits >> (i * 4)) & 0xF & !nibble == 0
            })
        };
        aligned(self.group_mask, self.group_bits) && aligned(self.element_mask, self.element_bits)
    }
}

/// Key of a rule table entry: either a single tag or a repeating group of tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagPattern {
    Exact(Tag),
    Repeating(RepeatingGroup),
}

impl TagPattern {
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            TagPattern::Exact(exact) => exact == tag,
            TagPattern::Repeating(group) => group.matches(tag),
        }
    }
}

impl From<Tag> for TagPattern {
    fn from(tag: Tag) -> Self {
        TagPattern::Exact(tag)
    }
}

impl From<RepeatingGroup> for TagPattern {
    fn from(group: RepeatingGroup) -> Self {
        TagPattern::Repeating(group)
    }
}

fn write_masked(f: &mut fmt::Formatter<'_>, bits: u16, mask: u16) -> fmt::Result {
    for i in (0..4).rev() {
        if (mask >> (i * 4)) & 0xF == 0 {
            write!(f, "x")?;
        } else {
            write!(f, "{:X}", (bits >> (i * 4)) & 0xF)?;
        }
    }
    Ok(())
}

impl fmt::Display for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPattern::Exact(tag) => write!(f, "({:04X},{:04X})", tag.group(), tag.element()),
            TagPattern::Repeating(group) if group.is_nibble_aligned() => {
                write!(f, "(")?;
                write_masked(f, group.group_bits, group.group_mask)?;
                write!(f, ",")?;
                write_masked(f, group.element_bits, group.element_mask)?;
                write!(f, ")")
            }
            TagPattern::Repeating(group) => write!(
                f,
                "({:04X},{:04X})&({:04X},{:04X})",
                group.group_bits, group.element_bits, group.group_mask, group.element_mask
            ),
        }
    }
}

// Parses a 4 digit hex field where `x` stands for "any nibble".
fn parse_masked(field: &str) -> Option<(u16, u16)> {
    if field.len() != 4 {
        return None;
    }
    let mut bits = 0u16;
    let mut mask = 0u16;
    for c in field.chars() {
        bits <<= 4;
        mask <<= 4;
        if c == 'x' || c == 'X' {
            continue;
        }
        bits |= c.to_digit(16)? as u16;
        mask |= 0xF;
    }
    Some((bits, mask))
}

fn parse_pair(s: &str) -> Option<(&str, &str)> {
    s.strip_prefix('(')?.strip_suffix(')')?.split_once(',')
}

impl FromStr for TagPattern {
    type Err = TagPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || {
            TagPatternError(format!(
                "expected '(GGGG,EEEE)', '(60xx,3000)' or '(GGGG,EEEE)&(MMMM,MMMM)', got: {s}"
            ))
        };

        if let Some((value, mask)) = s.split_once('&') {
            let (group, element) = parse_pair(value).ok_or_else(err)?;
            let (group_mask, element_mask) = parse_pair(mask).ok_or_else(err)?;
            let hex = |v: &str| {
                if v.len() == 4 {
                    u16::from_str_radix(v, 16).ok()
                } else {
                    None
                }
            };
            let group_mask = hex(group_mask).ok_or_else(err)?;
            let element_mask = hex(element_mask).ok_or_else(err)?;
            return Ok(TagPattern::Repeating(RepeatingGroup::new(
                hex(group).ok_or_else(err)? & group_mask,
                hex(element).ok_or_else(err)? & element_mask,
                group_mask,
                element_mask,
            )));
        }

        let (group, element) = parse_pair(s).ok_or_else(err)?;
        let (group_bits, group_mask) = parse_masked(group).ok_or_else(err)?;
        let (element_bits, element_mask) = parse_masked(element).ok_or_else(err)?;

        if group_mask == 0xFFFF && element_mask == 0xFFFF {
            Ok(TagPattern::Exact(Tag(group_bits, element_bits)))
        } else {
            Ok(TagPattern::Repeating(RepeatingGroup::new(
                group_bits,
                element_bits,
                group_mask,
                element_mask,
            )))
        }
    }
}
