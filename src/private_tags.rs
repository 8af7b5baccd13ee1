//! Capturing, removing and restoring private (odd group) data elements.
//!
//! A private data element `(gggg,xxee)` belongs to the block reserved by the
//! private creator element `(gggg,00xx)`, and `ee` is its offset in that block.
//! Blocks are identified by the creator name, not by their number, so restored
//! elements may end up in a block with a different number.

use dicom_core::header::Header;
use dicom_core::value::DataSetSequence;
use dicom_core::{PrimitiveValue, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;
use log::warn;

use crate::actions::ActionError;
use crate::tag_pattern::is_private_tag;

const FIRST_BLOCK: u16 = 0x0010;
const LAST_BLOCK: u16 = 0x00FF;

/// Owner of a block of private data elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivateCreator {
    pub group: u16,
    pub name: String,
}

/// A private data element, relative to the block of its creator.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateElementSnapshot {
    pub offset: u8,
    pub element: InMemElement,
}

/// A private creator, and for non-creator elements the element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateTagSnapshot {
    pub creator: PrivateCreator,
    pub element: Option<PrivateElementSnapshot>,
}

fn creator_name(elem: &InMemElement) -> Result<String, ActionError> {
    Ok(elem
        .to_str()?
        .trim_end_matches(['\0', ' '])
        .to_owned())
}

/// Records the private element at `tag` so it can be restored after all
/// private elements have been removed.
///
/// Returns `None` for standard or missing tags, and (with a warning) for private
/// elements without a creator.
pub fn capture(
    obj: &InMemDicomObject,
    tag: Tag,
) -> Result<Option<PrivateTagSnapshot>, ActionError> {
    if !is_private_tag(&tag) {
        return Ok(None);
    }
    let Some(elem) = obj.element_opt(tag)? else {
        return Ok(None);
    };

    let group = tag.group();
    let element = tag.element();

    if element < FIRST_BLOCK {
        warn!("private element {tag} is outside any private block, it will not be kept");
        return Ok(None);
    }

    if element <= LAST_BLOCK {
        return Ok(Some(PrivateTagSnapshot {
            creator: PrivateCreator {
                group,
                name: creator_name(elem)?,
            },
            element: None,
        }));
    }

    let block = element >> 8;
    let offset = element - (block << 8);
    let Some(creator_elem) = obj.element_opt(Tag(group, block))? else {
        warn!("private element {tag} has no private creator, it will not be kept");
        return Ok(None);
    };

    Ok(Some(PrivateTagSnapshot {
        creator: PrivateCreator {
            group,
            name: creator_name(creator_elem)?,
        },
        element: Some(PrivateElementSnapshot {
            offset: offset as u8,
            element: elem.clone(),
        }),
    }))
}

/// Removes every private element, at every level of nesting.
///
/// Returns the number of removed elements. A private sequence counts as one.
pub fn remove_private_tags(obj: &mut InMemDicomObject) -> usize {
    let mut private = Vec::new();
    let mut sequences = Vec::new();
    for elem in obj.iter() {
        if is_private_tag(&elem.tag()) {
            private.push(elem.tag());
        } else if let Some(items) = elem.items() {
            sequences.push((elem.tag(), items.to_vec()));
        }
    }

    let mut removed = 0;
    for tag in private {
        if obj.remove_element(tag) {
            removed += 1;
        }
    }

    for (tag, mut items) in sequences {
        let nested: usize = items.iter_mut().map(remove_private_tags).sum();
        if nested > 0 {
            obj.put(InMemElement::new(tag, VR::SQ, DataSetSequence::from(items)));
            removed += nested;
        }
    }

    removed
}

/// Finds the block reserved by `creator`, reserving the first free one if needed.
fn reserve_block(
    obj: &mut InMemDicomObject,
    creator: &PrivateCreator,
) -> Result<u16, ActionError> {
    let mut free = None;
    for block in FIRST_BLOCK..=LAST_BLOCK {
        match obj.element_opt(Tag(creator.group, block))? {
            Some(elem) if creator_name(elem)? == creator.name => return Ok(block),
            Some(_) => {}
            None => {
                free.get_or_insert(block);
            }
        }
    }

    let block = free.ok_or(ActionError::NoFreePrivateBlock {
        group: creator.group,
    })?;
    obj.put(InMemElement::new(
        Tag(creator.group, block),
        VR::LO,
        PrimitiveValue::from(creator.name.as_str()),
    ));
    Ok(block)
}

/// Puts the captured private elements back, each in the block of its creator.
///
/// Returns the number of restored non-creator elements.
pub fn restore(
    obj: &mut InMemDicomObject,
    snapshots: &[PrivateTagSnapshot],
) -> Result<usize, ActionError> {
    let mut restored = 0;
    for snapshot in snapshots {
        let block = reserve_block(obj, &snapshot.creator)?;
        if let Some(private_elem) = &snapshot.element {
            let tag = Tag(
                snapshot.creator.group,
                (block << 8) | u16::from(private_elem.offset),
            );
            obj.put(InMemElement::new(
                tag,
                private_elem.element.vr(),
                private_elem.element.value().clone(),
            ));
            restored += 1;
        }
    }
    Ok(restored)
}
