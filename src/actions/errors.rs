use dicom_core::value::ConvertValueError;
use dicom_core::{Tag, VR};
use dicom_object::AccessError;
use thiserror::Error;

use crate::pseudonym::CorrespondenceError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// The VR has no safe rewrite for the requested action. Leaving the value
    /// untouched could leak identifying data, so processing must stop.
    #[error("Unsupported VR {vr} for tag {tag}")]
    UnsupportedVR { tag: Tag, vr: VR },

    #[error("Missing path to the correspondence table")]
    MissingCorrespondenceTableConfig,

    #[error("Correspondence table error: {}", .0.to_lowercase())]
    IoFailure(String),

    #[error("Could not generate a unique pseudonym for {0}")]
    PseudonymCollision(String),

    #[error("No free private block left in group {group:04X}")]
    NoFreePrivateBlock { group: u16 },

    #[error("Invalid value: {}", .0.to_lowercase())]
    InvalidValue(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

impl From<ConvertValueError> for ActionError {
    fn from(err: ConvertValueError) -> Self {
        ActionError::InvalidValue(format!("{err}"))
    }
}

impl From<AccessError> for ActionError {
    fn from(err: AccessError) -> Self {
        ActionError::InvalidValue(format!("{err}"))
    }
}

impl From<regex::Error> for ActionError {
    fn from(err: regex::Error) -> Self {
        ActionError::InvalidPattern(format!("{err}"))
    }
}

impl From<CorrespondenceError> for ActionError {
    fn from(err: CorrespondenceError) -> Self {
        ActionError::IoFailure(format!("{err}"))
    }
}
