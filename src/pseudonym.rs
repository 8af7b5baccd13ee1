//! Persistent correspondence between real identifiers and their pseudonyms.
//!
//! The table is a CSV file with the header
//! `old_patient_id,new_patient_id,old_accession_number,new_accession_number`.
//! It is loaded on every pseudonymization and rewritten as a whole when a row
//! was added. Writes are not locked, so a table must not be shared by
//! concurrent processes.

use dicom_core::header::Header;
use dicom_core::{PrimitiveValue, Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::actions::{ActionError, Outcome, SkipReason};
use crate::hashing::{blake3_hash_fn, salted_hash, HashFn};
use crate::vr;

pub const HEADER: [&str; 4] = [
    "old_patient_id",
    "new_patient_id",
    "old_accession_number",
    "new_accession_number",
];

const SALT_LENGTH: usize = 32;
const MAX_ATTEMPTS: usize = 8;

#[derive(Error, Debug)]
pub enum CorrespondenceError {
    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("unexpected header in {}: {found}", .path.display())]
    Header { path: PathBuf, found: String },
}

/// A single row of the correspondence table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondence {
    pub old_patient_id: String,
    pub new_patient_id: String,
    pub old_accession_number: String,
    pub new_accession_number: String,
}

/// In-memory copy of the correspondence table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceTable {
    rows: Vec<Correspondence>,
}

impl CorrespondenceTable {
    /// Pseudonym already assigned to a patient.
    pub fn patient(&self, old_patient_id: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.old_patient_id == old_patient_id)
            .map(|row| row.new_patient_id.as_str())
    }

    /// Pseudonym already assigned to an accession number of a patient.
    pub fn accession(&self, old_patient_id: &str, old_accession_number: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| {
                row.old_patient_id == old_patient_id
                    && row.old_accession_number == old_accession_number
            })
            .map(|row| row.new_accession_number.as_str())
    }

    /// Returns `true` if `value` is already used as a pseudonym.
    pub fn contains_pseudonym(&self, value: &str) -> bool {
        self.rows
            .iter()
            .any(|row| row.new_patient_id == value || row.new_accession_number == value)
    }

    pub fn push(&mut self, row: Correspondence) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Correspondence] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Location of the correspondence table, plus the hash function used for new pseudonyms.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondenceStore {
    path: PathBuf,
    hash_fn: HashFn,
}

impl CorrespondenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hash_fn: blake3_hash_fn,
        }
    }

    pub fn with_hash_fn(mut self, hash_fn: HashFn) -> Self {
        self.hash_fn = hash_fn;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table. A missing or empty file is an empty table.
    pub fn load(&self) -> Result<CorrespondenceTable, CorrespondenceError> {
        if !self.path.exists() {
            return Ok(CorrespondenceTable::default());
        }

        let csv_err = |source| CorrespondenceError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?;
        if headers.is_empty() {
            return Ok(CorrespondenceTable::default());
        }
        if headers.iter().ne(HEADER) {
            return Err(CorrespondenceError::Header {
                path: self.path.clone(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut table = CorrespondenceTable::default();
        for row in reader.deserialize() {
            table.push(row.map_err(csv_err)?);
        }
        Ok(table)
    }

    /// Rewrites the whole table.
    ///
    /// The rows go to a sibling temporary file first, which then replaces the
    /// table, so a failed write leaves the previous table in place.
    pub fn save(&self, table: &CorrespondenceTable) -> Result<(), CorrespondenceError> {
        let mut tmp_path = OsString::from(self.path.as_os_str());
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let csv_err = |source| CorrespondenceError::Csv {
            path: tmp_path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)
            .map_err(csv_err)?;
        writer.write_record(HEADER).map_err(csv_err)?;
        for row in table.rows() {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| CorrespondenceError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|source| CorrespondenceError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Generates a pseudonym for `value` not yet used anywhere in `table` and
    /// different from `taken`, fitted to the maximum length of `vr`.
    fn fresh_pseudonym(
        &self,
        table: &CorrespondenceTable,
        value: &str,
        vr: VR,
        taken: Option<&str>,
    ) -> Result<String, ActionError> {
        let max_length = vr::max_length(vr).unwrap_or(64);
        for _ in 0..MAX_ATTEMPTS {
            let salt: [u8; SALT_LENGTH] = rand::random();
            let candidate: String = salted_hash(self.hash_fn, value, &salt)
                .chars()
                .take(max_length)
                .collect();
            if !table.contains_pseudonym(&candidate) && taken != Some(candidate.as_str()) {
                return Ok(candidate);
            }
            debug!("pseudonym collision for {value}, retrying");
        }
        Err(ActionError::PseudonymCollision(value.to_owned()))
    }
}

/// Tags written by [`pseudonymize`] when applied to `patient_tag`.
pub fn written_tags(patient_tag: Tag) -> [Tag; 2] {
    [patient_tag, tags::ACCESSION_NUMBER]
}

fn trimmed_text(elem: &InMemElement) -> Result<String, ActionError> {
    Ok(elem
        .to_str()?
        .trim_end_matches(['\0', ' '])
        .to_owned())
}

/// Original identifiers read from a data set.
struct Identifiers {
    patient_id: String,
    patient_vr: VR,
    accession_number: String,
}

/// Pseudonyms for a set of [`Identifiers`], and whether a row was added for them.
struct Assignment {
    patient_id: String,
    accession_number: String,
    added: bool,
}

fn read_identifiers(
    obj: &InMemDicomObject,
    patient_tag: Tag,
) -> Result<Option<Identifiers>, ActionError> {
    let (patient_id, patient_vr) = match obj.element_opt(patient_tag)? {
        Some(elem) => (trimmed_text(elem)?, elem.vr()),
        None => return Ok(None),
    };
    let accession_number = match obj.element_opt(tags::ACCESSION_NUMBER)? {
        Some(elem) => trimmed_text(elem)?,
        None => String::new(),
    };
    Ok(Some(Identifiers {
        patient_id,
        patient_vr,
        accession_number,
    }))
}

/// Looks up the pseudonyms for `ids`, adding a row to `table` when needed.
fn assign(
    store: &CorrespondenceStore,
    table: &mut CorrespondenceTable,
    ids: &Identifiers,
) -> Result<Assignment, ActionError> {
    let (patient_id, accession_number, added) = match table.patient(&ids.patient_id) {
        Some(patient_id) => {
            let patient_id = patient_id.to_owned();
            match table.accession(&ids.patient_id, &ids.accession_number) {
                Some(accession_number) => (patient_id, accession_number.to_owned(), false),
                None => {
                    let accession_number = store.fresh_pseudonym(
                        table,
                        &ids.accession_number,
                        VR::SH,
                        Some(&patient_id),
                    )?;
                    (patient_id, accession_number, true)
                }
            }
        }
        None => {
            let patient_id =
                store.fresh_pseudonym(table, &ids.patient_id, ids.patient_vr, None)?;
            let accession_number = store.fresh_pseudonym(
                table,
                &ids.accession_number,
                VR::SH,
                Some(&patient_id),
            )?;
            (patient_id, accession_number, true)
        }
    };

    if added {
        table.push(Correspondence {
            old_patient_id: ids.patient_id.clone(),
            new_patient_id: patient_id.clone(),
            old_accession_number: ids.accession_number.clone(),
            new_accession_number: accession_number.clone(),
        });
        debug!("new correspondence for patient {}", ids.patient_id);
    }

    Ok(Assignment {
        patient_id,
        accession_number,
        added,
    })
}

fn write_pseudonyms(
    obj: &mut InMemDicomObject,
    patient_tag: Tag,
    ids: &Identifiers,
    assignment: Assignment,
) {
    obj.put(InMemElement::new(
        patient_tag,
        ids.patient_vr,
        PrimitiveValue::from(assignment.patient_id),
    ));
    obj.put(InMemElement::new(
        tags::ACCESSION_NUMBER,
        VR::SH,
        PrimitiveValue::from(assignment.accession_number),
    ));
}

/// Replaces the patient identifier at `patient_tag` and the Accession Number
/// with pseudonyms recorded in the correspondence table.
///
/// A patient seen before keeps their pseudonym. An accession number seen
/// before for the same patient keeps its pseudonym too, in which case the table
/// is not written. A missing Accession Number counts as an empty one.
///
/// The table is saved before the data set is changed. Use
/// [`pseudonymize_deferred`] to save only once the whole data set is done.
pub fn pseudonymize(
    obj: &mut InMemDicomObject,
    patient_tag: Tag,
    store: Option<&CorrespondenceStore>,
) -> Result<Outcome, ActionError> {
    let store = store.ok_or(ActionError::MissingCorrespondenceTableConfig)?;
    let Some(ids) = read_identifiers(obj, patient_tag)? else {
        return Ok(Outcome::Skipped(SkipReason::NotFound));
    };

    let mut table = store.load()?;
    let assignment = assign(store, &mut table, &ids)?;
    if assignment.added {
        store.save(&table)?;
        info!(
            "added correspondence for patient {} to {}",
            ids.patient_id,
            store.path().display()
        );
    }

    write_pseudonyms(obj, patient_tag, &ids, assignment);
    Ok(Outcome::Applied)
}

/// Same as [`pseudonymize`], but new rows are kept in `pending` instead of
/// being saved.
///
/// `pending` holds the table with rows not saved yet. It is read instead of
/// the file when set, and is set whenever a row was added. Saving it is left
/// to the caller, see [`crate::actions::ActionContext::commit`].
pub fn pseudonymize_deferred(
    obj: &mut InMemDicomObject,
    patient_tag: Tag,
    store: Option<&CorrespondenceStore>,
    pending: &mut Option<CorrespondenceTable>,
) -> Result<Outcome, ActionError> {
    let store = store.ok_or(ActionError::MissingCorrespondenceTableConfig)?;
    let Some(ids) = read_identifiers(obj, patient_tag)? else {
        return Ok(Outcome::Skipped(SkipReason::NotFound));
    };

    let (mut table, dirty) = match pending.take() {
        Some(table) => (table, true),
        None => (store.load()?, false),
    };
    let assignment = assign(store, &mut table, &ids)?;
    if dirty || assignment.added {
        *pending = Some(table);
    }

    write_pseudonyms(obj, patient_tag, &ids, assignment);
    Ok(Outcome::Applied)
}
