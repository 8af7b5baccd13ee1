//! De-identification of DICOM data sets.
//!
//! Every data element is processed according to a rule table which maps tags
//! (or repeating groups of tags) to an [`actions::Action`]. The default table
//! follows the DICOM basic application level confidentiality profile, with the
//! Patient ID and Accession Number replaced by pseudonyms that are recorded in
//! a correspondence table.
//!
//! # Example
//!
//! ```no_run
//! use dicom_pseudonymizer::config::ConfigBuilder;
//! use dicom_pseudonymizer::Pseudonymizer;
//! use std::path::Path;
//!
//! let config = ConfigBuilder::default()
//!     .lookup_table("lookup.csv")
//!     .build();
//! let mut pseudonymizer = Pseudonymizer::new(config);
//! let output = pseudonymizer
//!     .anonymize_file(Path::new("input.dcm"), Path::new("output.dcm"))
//!     .unwrap();
//! ```

pub mod actions;
pub mod config;
pub mod hashing;
pub mod private_tags;
pub mod processor;
pub mod pseudonym;
pub mod tag_pattern;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod vr;

pub use dicom_dictionary_std::tags;

use dicom_object::{open_file, DefaultDicomObject, InMemDicomObject};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::actions::ActionContext;
use crate::config::Config;
use crate::processor::{Processor, Report, RuleProcessor};
use crate::pseudonym::CorrespondenceStore;

#[derive(Error, Debug, PartialEq)]
pub enum PseudonymizationError {
    #[error("Read error: {}", .0.to_lowercase())]
    ReadError(String),

    #[error("Write error: {}", .0.to_lowercase())]
    WriteError(String),

    #[error("Processing error: {}", .0.to_lowercase())]
    ProcessingError(String),
}

impl From<processor::Error> for PseudonymizationError {
    fn from(err: processor::Error) -> Self {
        PseudonymizationError::ProcessingError(format!("{err}"))
    }
}

pub type Result<T, E = PseudonymizationError> = std::result::Result<T, E>;

/// Applies a [`Processor`] to data sets and files, keeping the state that has to
/// be shared by every file of a batch.
///
/// UIDs are remapped consistently across all data sets processed by the same
/// `Pseudonymizer`, so files must be processed one after the other with a
/// single instance.
pub struct Pseudonymizer {
    processor: Box<dyn Processor>,
    ctx: ActionContext,
    rename_output: bool,
}

impl Pseudonymizer {
    pub fn new(config: Config) -> Self {
        let store = config
            .lookup_table()
            .map(|path| CorrespondenceStore::new(path).with_hash_fn(config.get_hash_fn()));
        Self {
            processor: Box::new(RuleProcessor::from_config(&config)),
            ctx: ActionContext::new(store),
            rename_output: config.rename_output(),
        }
    }

    /// Creates a `Pseudonymizer` around a custom processor.
    pub fn with_processor<P: Processor + 'static>(processor: P, ctx: ActionContext) -> Self {
        Self {
            processor: Box::new(processor),
            ctx,
            rename_output: false,
        }
    }

    pub fn context(&self) -> &ActionContext {
        &self.ctx
    }

    /// De-identifies a data set in place.
    pub fn anonymize_dataset(&mut self, obj: &mut InMemDicomObject) -> Result<Report> {
        Ok(self.processor.process(obj, &mut self.ctx)?)
    }

    /// De-identifies a data set read from a file, keeping the Media Storage SOP
    /// Instance UID of the file meta group in line with the SOP Instance UID.
    pub fn anonymize_object(&mut self, obj: &mut DefaultDicomObject) -> Result<Report> {
        let report = self.anonymize_dataset(obj)?;

        let meta = obj.meta_mut();
        let old_uid = &meta.media_storage_sop_instance_uid;
        if let Some(new_uid) = self.ctx.remap.get(old_uid) {
            // remapped UIDs keep their length, so the padding keeps the group length valid
            let padding = &old_uid[old_uid.trim_end_matches(['\0', ' ']).len()..];
            meta.media_storage_sop_instance_uid = format!("{new_uid}{padding}");
        }
        Ok(report)
    }

    /// De-identifies the DICOM file at `input` and writes the result.
    ///
    /// `output` is either the output file, or an existing directory in which
    /// the file is written under the name of the input file. If output renaming
    /// is enabled, the file is written in the output directory as
    /// `<n>_<PatientID>-<AccessionNumber>`, where `n` is the number of entries
    /// already in that directory, see [`rename_output`].
    ///
    /// Returns the path of the written file. Nothing is written if
    /// de-identification fails.
    pub fn anonymize_file(&mut self, input: &Path, output: &Path) -> Result<PathBuf> {
        let mut obj = open_file(input).map_err(|err| {
            PseudonymizationError::ReadError(format!("{}: {err}", input.display()))
        })?;

        let report = self.anonymize_object(&mut obj)?;
        debug!("{}: {report:?}", input.display());

        let destination = if self.rename_output {
            let dir = if output.is_dir() {
                output
            } else {
                output.parent().unwrap_or(Path::new("."))
            };
            dir.join(rename_output(&obj, dir)?)
        } else if output.is_dir() {
            let file_name = input.file_name().ok_or_else(|| {
                PseudonymizationError::WriteError(format!(
                    "{} has no file name",
                    input.display()
                ))
            })?;
            output.join(file_name)
        } else {
            output.to_path_buf()
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                PseudonymizationError::WriteError(format!("{}: {err}", parent.display()))
            })?;
        }
        obj.write_to_file(&destination).map_err(|err| {
            PseudonymizationError::WriteError(format!("{}: {err}", destination.display()))
        })?;

        info!("{} -> {}", input.display(), destination.display());
        Ok(destination)
    }
}

fn element_text(obj: &InMemDicomObject, tag: dicom_core::Tag) -> Result<String> {
    let value = match obj.element_opt(tag) {
        Ok(Some(elem)) => elem
            .to_str()
            .map_err(|err| PseudonymizationError::ProcessingError(format!("{err}")))?
            .trim_end_matches(['\0', ' '])
            .to_owned(),
        Ok(None) => String::new(),
        Err(err) => return Err(PseudonymizationError::ProcessingError(format!("{err}"))),
    };
    Ok(value)
}

/// Replaces every character outside `[A-Za-z0-9._-]` by `_`, so that the
/// result cannot hold a path separator.
fn file_name_component(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name for a de-identified data set written in `dir`:
/// `<n>_<PatientID>-<AccessionNumber>`, `n` being the number of entries in `dir`.
///
/// Characters of the identifiers that are not allowed in a portable file name
/// are replaced by `_`. The name always starts with `<n>_`, so it is never `.`
/// or `..`.
pub fn rename_output(obj: &InMemDicomObject, dir: &Path) -> Result<String> {
    let count = match fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
        Err(err) => {
            return Err(PseudonymizationError::WriteError(format!(
                "{}: {err}",
                dir.display()
            )))
        }
    };
    let patient_id = file_name_component(&element_text(obj, tags::PATIENT_ID)?);
    let accession_number = file_name_component(&element_text(obj, tags::ACCESSION_NUMBER)?);
    Ok(format!("{count}_{patient_id}-{accession_number}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use dicom_core::value::Value;
    use dicom_core::{Tag, VR};
    use dicom_object::mem::InMemElement;
    use dicom_object::FileDicomObject;

    use crate::actions::Action;
    use crate::config::ConfigBuilder;
    use crate::pseudonym::CorrespondenceStore;
    use crate::test_utils::{make_file_meta, SOP_INSTANCE_UID};

    fn write_test_file(path: &Path, patient_id: &str) {
        let mut obj = FileDicomObject::new_empty_with_meta(make_file_meta());
        obj.put(InMemElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            Value::from(SOP_INSTANCE_UID),
        ));
        obj.put(InMemElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            Value::from("Jane Doe"),
        ));
        obj.put(InMemElement::new(
            tags::PATIENT_ID,
            VR::LO,
            Value::from(patient_id),
        ));
        obj.put(InMemElement::new(
            tags::ACCESSION_NUMBER,
            VR::SH,
            Value::from("ACC001"),
        ));
        obj.put(InMemElement::new(
            Tag(0x0009, 0x0010),
            VR::LO,
            Value::from("ACME"),
        ));
        obj.put(InMemElement::new(
            Tag(0x0009, 0x1001),
            VR::LO,
            Value::from("private"),
        ));
        obj.write_to_file(path).unwrap();
    }

    fn text(obj: &InMemDicomObject, tag: Tag) -> String {
        obj.element(tag).unwrap().to_str().unwrap().to_string()
    }

    #[test]
    fn test_anonymize_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.dcm");
        let output = dir.path().join("output.dcm");
        write_test_file(&input, "12345");

        let config = ConfigBuilder::default()
            .lookup_table(dir.path().join("lookup.csv"))
            .build();
        let mut pseudonymizer = Pseudonymizer::new(config);
        let written = pseudonymizer.anonymize_file(&input, &output).unwrap();
        assert_eq!(written, output);

        let obj = open_file(&output).unwrap();
        assert_eq!(text(&obj, tags::PATIENT_NAME), vr::DUMMY_TEXT);
        assert_ne!(text(&obj, tags::PATIENT_ID), "12345");
        assert!(obj.element_opt(Tag(0x0009, 0x1001)).unwrap().is_none());

        let new_uid = text(&obj, tags::SOP_INSTANCE_UID);
        assert_ne!(new_uid, SOP_INSTANCE_UID);
        assert_eq!(
            obj.meta()
                .media_storage_sop_instance_uid
                .trim_end_matches('\0'),
            new_uid
        );

        let table = CorrespondenceStore::new(dir.path().join("lookup.csv"))
            .load()
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.patient("12345"), Some(text(&obj, tags::PATIENT_ID).as_str()));
    }

    #[test]
    fn test_anonymize_file_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.dcm");
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        write_test_file(&input, "12345");

        let config = ConfigBuilder::default()
            .lookup_table(dir.path().join("lookup.csv"))
            .build();
        let mut pseudonymizer = Pseudonymizer::new(config);
        let written = pseudonymizer.anonymize_file(&input, &out_dir).unwrap();

        assert_eq!(written, out_dir.join("input.dcm"));
        assert!(written.is_file());
    }

    #[test]
    fn test_anonymize_file_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let first = dir.path().join("first.dcm");
        let second = dir.path().join("second.dcm");
        write_test_file(&first, "12345");
        write_test_file(&second, "67890");

        let config = ConfigBuilder::default()
            .lookup_table(dir.path().join("lookup.csv"))
            .rename_output(true)
            .build();
        let mut pseudonymizer = Pseudonymizer::new(config);

        let written = pseudonymizer.anonymize_file(&first, &out_dir).unwrap();
        let obj = open_file(&written).unwrap();
        let expected = format!(
            "0_{}-{}",
            text(&obj, tags::PATIENT_ID),
            text(&obj, tags::ACCESSION_NUMBER)
        );
        assert_eq!(written, out_dir.join(expected));

        let written = pseudonymizer.anonymize_file(&second, &out_dir).unwrap();
        let name = written.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("1_"));
    }

    #[test]
    fn test_uids_shared_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.dcm");
        let second = dir.path().join("second.dcm");
        write_test_file(&first, "12345");
        write_test_file(&second, "12345");

        let config = ConfigBuilder::default()
            .lookup_table(dir.path().join("lookup.csv"))
            .build();
        let mut pseudonymizer = Pseudonymizer::new(config);
        let first_out = pseudonymizer
            .anonymize_file(&first, &dir.path().join("first_out.dcm"))
            .unwrap();
        let second_out = pseudonymizer
            .anonymize_file(&second, &dir.path().join("second_out.dcm"))
            .unwrap();

        let first_obj = open_file(first_out).unwrap();
        let second_obj = open_file(second_out).unwrap();
        assert_eq!(
            text(&first_obj, tags::SOP_INSTANCE_UID),
            text(&second_obj, tags::SOP_INSTANCE_UID)
        );
        assert_eq!(
            text(&first_obj, tags::PATIENT_ID),
            text(&second_obj, tags::PATIENT_ID)
        );
    }

    #[test]
    fn test_anonymize_file_not_dicom() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        fs::write(&input, "not a DICOM file").unwrap();

        let mut pseudonymizer = Pseudonymizer::new(ConfigBuilder::new().build());
        let result = pseudonymizer.anonymize_file(&input, &dir.path().join("out.dcm"));

        assert!(matches!(result, Err(PseudonymizationError::ReadError(_))));
    }

    #[test]
    fn test_failed_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.dcm");
        let output = dir.path().join("output.dcm");
        write_test_file(&input, "12345");

        // the default profile pseudonymizes the Patient ID, which needs a lookup table
        let mut pseudonymizer = Pseudonymizer::new(Config::default());
        let result = pseudonymizer.anonymize_file(&input, &output);

        assert!(matches!(
            result,
            Err(PseudonymizationError::ProcessingError(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_rename_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("existing"), "").unwrap();
        let obj = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::PATIENT_ID, VR::LO, Value::from("PAT ")),
            InMemElement::new(tags::ACCESSION_NUMBER, VR::SH, Value::from("ACC")),
        ]);

        assert_eq!(rename_output(&obj, dir.path()).unwrap(), "1_PAT-ACC");
        assert_eq!(
            rename_output(&InMemDicomObject::new_empty(), &dir.path().join("missing"))
                .unwrap(),
            "0_-"
        );
    }

    #[test]
    fn test_rename_output_stays_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let obj = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::PATIENT_ID, VR::LO, Value::from("a/../../b")),
            InMemElement::new(tags::ACCESSION_NUMBER, VR::SH, Value::from("..\\x y")),
        ]);

        let name = rename_output(&obj, dir.path()).unwrap();

        assert_eq!(name, "0_a_.._.._b-.._x_y");
        assert_eq!(dir.path().join(&name).parent(), Some(dir.path()));
    }

    #[test]
    fn test_anonymize_file_renamed_with_kept_path_in_patient_id() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.dcm");
        let out_dir = dir.path().join("a").join("out");
        fs::create_dir_all(&out_dir).unwrap();
        write_test_file(&input, "x/../../../escaped");

        let config = ConfigBuilder::new()
            .tag_action(tags::PATIENT_ID, Action::Keep)
            .rename_output(true)
            .build();
        let mut pseudonymizer = Pseudonymizer::new(config);
        let written = pseudonymizer.anonymize_file(&input, &out_dir).unwrap();

        assert_eq!(written.parent(), Some(out_dir.as_path()));
        assert_eq!(
            written.file_name().unwrap().to_str().unwrap(),
            "0_x_.._.._.._escaped-ACC001"
        );
        assert!(!dir.path().join("escaped-ACC001").exists());
    }
}
