//! The default rule profile, after the Basic Application Level Confidentiality
//! Profile of DICOM PS3.15 (Table E.1-1).
//!
//! Every group of tags gets the action of its profile column. Groups are
//! applied in declaration order, so a tag listed twice takes the later action.

use dicom_core::Tag;

use super::rule_table::RuleTable;
use crate::actions::Action;
use crate::tag_pattern::RepeatingGroup;

/// D: replace with a dummy value.
pub(crate) const D_TAGS: &[Tag] = &[
    Tag(0x0010, 0x0010), // PatientName
    Tag(0x0040, 0x1101), // PersonIdentificationCodeSequence
    Tag(0x0040, 0xA123), // PersonName
    Tag(0x0040, 0xA073), // VerifyingObserverSequence
    Tag(0x0040, 0xA075), // VerifyingObserverName
    Tag(0x0070, 0x0001), // GraphicAnnotationSequence
];

/// Z: replace with an empty value.
pub(crate) const Z_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0020), // StudyDate
    Tag(0x0008, 0x0030), // StudyTime
    Tag(0x0008, 0x0050), // AccessionNumber
    Tag(0x0008, 0x0090), // ReferringPhysicianName
    Tag(0x0010, 0x0030), // PatientBirthDate
    Tag(0x0010, 0x0040), // PatientSex
    Tag(0x0020, 0x0010), // StudyID
    Tag(0x0040, 0x2016), // PlacerOrderNumberImagingServiceRequest
    Tag(0x0040, 0x2017), // FillerOrderNumberImagingServiceRequest
    Tag(0x0040, 0xA088), // VerifyingObserverIdentificationCodeSequence
    Tag(0x0070, 0x0084), // ContentCreatorName
];

/// X: remove.
pub(crate) const X_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0024), // OverlayDate
    Tag(0x0008, 0x0025), // CurveDate
    Tag(0x0008, 0x0034), // OverlayTime
    Tag(0x0008, 0x0035), // CurveTime
    Tag(0x0008, 0x0081), // InstitutionAddress
    Tag(0x0008, 0x0092), // ReferringPhysicianAddress
    Tag(0x0008, 0x0094), // ReferringPhysicianTelephoneNumbers
    Tag(0x0008, 0x0096), // ReferringPhysicianIdentificationSequence
    Tag(0x0008, 0x0201), // TimezoneOffsetFromUTC
    Tag(0x0008, 0x1030), // StudyDescription
    Tag(0x0008, 0x103E), // SeriesDescription
    Tag(0x0008, 0x1040), // InstitutionalDepartmentName
    Tag(0x0008, 0x1048), // PhysiciansOfRecord
    Tag(0x0008, 0x1049), // PhysiciansOfRecordIdentificationSequence
    Tag(0x0008, 0x1050), // PerformingPhysicianName
    Tag(0x0008, 0x1052), // PerformingPhysicianIdentificationSequence
    Tag(0x0008, 0x1060), // NameOfPhysiciansReadingStudy
    Tag(0x0008, 0x1062), // PhysiciansReadingStudyIdentificationSequence
    Tag(0x0008, 0x1080), // AdmittingDiagnosesDescription
    Tag(0x0008, 0x1084), // AdmittingDiagnosesCodeSequence
    Tag(0x0008, 0x1120), // ReferencedPatientSequence
    Tag(0x0008, 0x2111), // DerivationDescription
    Tag(0x0008, 0x4000), // IdentifyingComments
    Tag(0x0010, 0x0021), // IssuerOfPatientID
    Tag(0x0010, 0x0032), // PatientBirthTime
    Tag(0x0010, 0x0050), // PatientInsurancePlanCodeSequence
    Tag(0x0010, 0x0101), // PatientPrimaryLanguageCodeSequence
    Tag(0x0010, 0x0102), // PatientPrimaryLanguageModifierCodeSequence
    Tag(0x0010, 0x1000), // OtherPatientIDs
    Tag(0x0010, 0x1001), // OtherPatientNames
    Tag(0x0010, 0x1002), // OtherPatientIDsSequence
    Tag(0x0010, 0x1005), // PatientBirthName
    Tag(0x0010, 0x1010), // PatientAge
    Tag(0x0010, 0x1020), // PatientSize
    Tag(0x0010, 0x1030), // PatientWeight
    Tag(0x0010, 0x1040), // PatientAddress
    Tag(0x0010, 0x1050), // InsurancePlanIdentification
    Tag(0x0010, 0x1060), // PatientMotherBirthName
    Tag(0x0010, 0x1080), // MilitaryRank
    Tag(0x0010, 0x1081), // BranchOfService
    Tag(0x0010, 0x1090), // MedicalRecordLocator
    Tag(0x0010, 0x2000), // MedicalAlerts
    Tag(0x0010, 0x2110), // Allergies
    Tag(0x0010, 0x2150), // CountryOfResidence
    Tag(0x0010, 0x2152), // RegionOfResidence
    Tag(0x0010, 0x2154), // PatientTelephoneNumbers
    Tag(0x0010, 0x2160), // EthnicGroup
    Tag(0x0010, 0x2180), // Occupation
    Tag(0x0010, 0x21A0), // SmokingStatus
    Tag(0x0010, 0x21B0), // AdditionalPatientHistory
    Tag(0x0010, 0x21C0), // PregnancyStatus
    Tag(0x0010, 0x21D0), // LastMenstrualDate
    Tag(0x0010, 0x21F0), // PatientReligiousPreference
    Tag(0x0010, 0x2297), // ResponsiblePerson
    Tag(0x0010, 0x2299), // ResponsibleOrganization
    Tag(0x0010, 0x4000), // PatientComments
    Tag(0x0018, 0x1004), // PlateID
    Tag(0x0018, 0x1005), // GeneratorID
    Tag(0x0018, 0x1007), // CassetteID
    Tag(0x0018, 0x1008), // GantryID
    Tag(0x0018, 0x4000), // AcquisitionComments
    Tag(0x0018, 0x9424), // AcquisitionProtocolDescription
    Tag(0x0018, 0xA003), // ContributionDescription
    Tag(0x0020, 0x3401), // ModifyingDeviceID
    Tag(0x0020, 0x3404), // ModifyingDeviceManufacturer
    Tag(0x0020, 0x3406), // ModifiedImageDescription
    Tag(0x0020, 0x4000), // ImageComments
    Tag(0x0020, 0x9158), // FrameComments
    Tag(0x0028, 0x4000), // ImagePresentationComments
    Tag(0x0032, 0x0012), // StudyIDIssuer
    Tag(0x0032, 0x1020), // ScheduledStudyLocation
    Tag(0x0032, 0x1021), // ScheduledStudyLocationAETitle
    Tag(0x0032, 0x1030), // ReasonForStudy
    Tag(0x0032, 0x1032), // RequestingPhysician
    Tag(0x0032, 0x1033), // RequestingService
    Tag(0x0032, 0x1070), // RequestedContrastAgent
    Tag(0x0032, 0x4000), // StudyComments
    Tag(0x0038, 0x0004), // ReferencedPatientAliasSequence
    Tag(0x0038, 0x0010), // AdmissionID
    Tag(0x0038, 0x0011), // IssuerOfAdmissionID
    Tag(0x0038, 0x001E), // ScheduledPatientInstitutionResidence
    Tag(0x0038, 0x0020), // AdmittingDate
    Tag(0x0038, 0x0021), // AdmittingTime
    Tag(0x0038, 0x0040), // DischargeDiagnosisDescription
    Tag(0x0038, 0x0050), // SpecialNeeds
    Tag(0x0038, 0x0060), // ServiceEpisodeID
    Tag(0x0038, 0x0061), // IssuerOfServiceEpisodeID
    Tag(0x0038, 0x0062), // ServiceEpisodeDescription
    Tag(0x0038, 0x0300), // CurrentPatientLocation
    Tag(0x0038, 0x0400), // PatientInstitutionResidence
    Tag(0x0038, 0x0500), // PatientState
    Tag(0x0038, 0x4000), // VisitComments
    Tag(0x0040, 0x0001), // ScheduledStationAETitle
    Tag(0x0040, 0x0002), // ScheduledProcedureStepStartDate
    Tag(0x0040, 0x0003), // ScheduledProcedureStepStartTime
    Tag(0x0040, 0x0004), // ScheduledProcedureStepEndDate
    Tag(0x0040, 0x0005), // ScheduledProcedureStepEndTime
    Tag(0x0040, 0x0006), // ScheduledPerformingPhysicianName
    Tag(0x0040, 0x0007), // ScheduledProcedureStepDescription
    Tag(0x0040, 0x000B), // ScheduledPerformingPhysicianIdentificationSequence
    Tag(0x0040, 0x0010), // ScheduledStationName
    Tag(0x0040, 0x0011), // ScheduledProcedureStepLocation
    Tag(0x0040, 0x0012), // PreMedication
    Tag(0x0040, 0x0241), // PerformedStationAETitle
    Tag(0x0040, 0x0242), // PerformedStationName
    Tag(0x0040, 0x0243), // PerformedLocation
    Tag(0x0040, 0x0244), // PerformedProcedureStepStartDate
    Tag(0x0040, 0x0245), // PerformedProcedureStepStartTime
    Tag(0x0040, 0x0253), // PerformedProcedureStepID
    Tag(0x0040, 0x0254), // PerformedProcedureStepDescription
    Tag(0x0040, 0x0275), // RequestAttributesSequence
    Tag(0x0040, 0x0280), // CommentsOnThePerformedProcedureStep
    Tag(0x0040, 0x0555), // AcquisitionContextSequence
    Tag(0x0040, 0x1001), // RequestedProcedureID
    Tag(0x0040, 0x1004), // PatientTransportArrangements
    Tag(0x0040, 0x1005), // RequestedProcedureLocation
    Tag(0x0040, 0x1010), // NamesOfIntendedRecipientsOfResults
    Tag(0x0040, 0x1011), // IntendedRecipientsOfResultsIdentificationSequence
    Tag(0x0040, 0x1102), // PersonAddress
    Tag(0x0040, 0x1103), // PersonTelephoneNumbers
    Tag(0x0040, 0x1400), // RequestedProcedureComments
    Tag(0x0040, 0x2001), // ReasonForTheImagingServiceRequest
    Tag(0x0040, 0x2008), // OrderEnteredBy
    Tag(0x0040, 0x2009), // OrderEntererLocation
    Tag(0x0040, 0x2010), // OrderCallbackPhoneNumber
    Tag(0x0040, 0x2400), // ImagingServiceRequestComments
    Tag(0x0040, 0x3001), // ConfidentialityConstraintOnPatientDataDescription
    Tag(0x0040, 0x4025), // ScheduledStationNameCodeSequence
    Tag(0x0040, 0x4027), // ScheduledStationGeographicLocationCodeSequence
    Tag(0x0040, 0x4028), // PerformedStationNameCodeSequence
    Tag(0x0040, 0x4030), // PerformedStationGeographicLocationCodeSequence
    Tag(0x0040, 0x4034), // ScheduledHumanPerformersSequence
    Tag(0x0040, 0x4035), // ActualHumanPerformersSequence
    Tag(0x0040, 0x4036), // HumanPerformerOrganization
    Tag(0x0040, 0x4037), // HumanPerformerName
    Tag(0x0040, 0xA027), // VerifyingOrganization
    Tag(0x0040, 0xA078), // AuthorObserverSequence
    Tag(0x0040, 0xA07A), // ParticipantSequence
    Tag(0x0040, 0xA07C), // CustodialOrganizationSequence
    Tag(0x0040, 0xA730), // ContentSequence
    Tag(0x0070, 0x0086), // ContentCreatorIdentificationCodeSequence
    Tag(0x0088, 0x0200), // IconImageSequence
    Tag(0x0088, 0x0904), // TopicTitle
    Tag(0x0088, 0x0906), // TopicSubject
    Tag(0x0088, 0x0910), // TopicAuthor
    Tag(0x0088, 0x0912), // TopicKeywords
    Tag(0x0400, 0x0100), // DigitalSignatureUID
    Tag(0x0400, 0x0402), // ReferencedDigitalSignatureSequence
    Tag(0x0400, 0x0403), // ReferencedSOPInstanceMACSequence
    Tag(0x0400, 0x0404), // MAC
    Tag(0x0400, 0x0550), // ModifiedAttributesSequence
    Tag(0x0400, 0x0561), // OriginalAttributesSequence
    Tag(0x2030, 0x0020), // TextString
    Tag(0x4000, 0x0010), // Arbitrary
    Tag(0x4000, 0x4000), // TextComments
    Tag(0x4008, 0x0042), // ResultsIDIssuer
    Tag(0x4008, 0x0102), // InterpretationRecorder
    Tag(0x4008, 0x010A), // InterpretationTranscriber
    Tag(0x4008, 0x010B), // InterpretationText
    Tag(0x4008, 0x010C), // InterpretationAuthor
    Tag(0x4008, 0x0111), // InterpretationApproverSequence
    Tag(0x4008, 0x0114), // PhysicianApprovingInterpretation
    Tag(0x4008, 0x0115), // InterpretationDiagnosisDescription
    Tag(0x4008, 0x0118), // ResultsDistributionListSequence
    Tag(0x4008, 0x0119), // DistributionName
    Tag(0x4008, 0x011A), // DistributionAddress
    Tag(0x4008, 0x0202), // InterpretationIDIssuer
    Tag(0x4008, 0x0300), // Impressions
    Tag(0x4008, 0x4000), // ResultsComments
    Tag(0xFFFA, 0xFFFA), // DigitalSignaturesSequence
    Tag(0xFFFC, 0xFFFC), // DataSetTrailingPadding
];

/// U: replace with a consistent replacement UID.
pub(crate) const U_TAGS: &[Tag] = &[
    Tag(0x0004, 0x1511), // ReferencedSOPInstanceUIDInFile
    Tag(0x0008, 0x0014), // InstanceCreatorUID
    Tag(0x0008, 0x0018), // SOPInstanceUID
    Tag(0x0008, 0x0058), // FailedSOPInstanceUIDList
    Tag(0x0008, 0x010D), // ContextGroupExtensionCreatorUID
    Tag(0x0008, 0x1155), // ReferencedSOPInstanceUID
    Tag(0x0008, 0x1195), // TransactionUID
    Tag(0x0008, 0x3010), // IrradiationEventUID
    Tag(0x0008, 0x9123), // CreatorVersionUID
    Tag(0x0018, 0x1002), // DeviceUID
    Tag(0x0020, 0x000D), // StudyInstanceUID
    Tag(0x0020, 0x000E), // SeriesInstanceUID
    Tag(0x0020, 0x0052), // FrameOfReferenceUID
    Tag(0x0020, 0x0200), // SynchronizationFrameOfReferenceUID
    Tag(0x0020, 0x9161), // ConcatenationUID
    Tag(0x0020, 0x9164), // DimensionOrganizationUID
    Tag(0x0028, 0x1214), // LargePaletteColorLookupTableUID
    Tag(0x0040, 0x4023), // ReferencedGeneralPurposeScheduledProcedureStepTransactionUID
    Tag(0x0040, 0xA124), // UID
    Tag(0x0040, 0xDB0C), // TemplateExtensionOrganizationUID
    Tag(0x0040, 0xDB0D), // TemplateExtensionCreatorUID
    Tag(0x0070, 0x031A), // FiducialUID
    Tag(0x0088, 0x0140), // StorageMediaFileSetUID
    Tag(0x300A, 0x0013), // DoseReferenceUID
    Tag(0x3006, 0x0024), // ReferencedFrameOfReferenceUID
    Tag(0x3006, 0x00C2), // RelatedFrameOfReferenceUID
];

/// Z/D: empty unless a dummy value is needed.
pub(crate) const Z_D_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0023), // ContentDate
    Tag(0x0008, 0x0033), // ContentTime
    Tag(0x0018, 0x0010), // ContrastBolusAgent
];

/// X/Z: remove unless an empty value is needed.
pub(crate) const X_Z_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0022), // AcquisitionDate
    Tag(0x0008, 0x0032), // AcquisitionTime
    Tag(0x0008, 0x1110), // ReferencedStudySequence
    Tag(0x0010, 0x2203), // PatientSexNeutered
    Tag(0x300E, 0x0008), // ReviewerName
];

/// X/D: remove unless a dummy value is needed.
pub(crate) const X_D_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0021), // SeriesDate
    Tag(0x0008, 0x002A), // AcquisitionDateTime
    Tag(0x0008, 0x0031), // SeriesTime
    Tag(0x0008, 0x1072), // OperatorIdentificationSequence
    Tag(0x0018, 0x1030), // ProtocolName
    Tag(0x0018, 0x1400), // AcquisitionDeviceProcessingDescription
    Tag(0x0018, 0x700A), // DetectorID
    Tag(0x0018, 0x9517), // EndAcquisitionDateTime
];

/// X/Z/D: remove unless an empty or dummy value is needed.
pub(crate) const X_Z_D_TAGS: &[Tag] = &[
    Tag(0x0008, 0x0080), // InstitutionName
    Tag(0x0008, 0x0082), // InstitutionCodeSequence
    Tag(0x0008, 0x1010), // StationName
    Tag(0x0008, 0x1070), // OperatorsName
    Tag(0x0008, 0x1111), // ReferencedPerformedProcedureStepSequence
    Tag(0x0018, 0x1000), // DeviceSerialNumber
];

/// X/Z/U*: remove unless an empty value or replaced UIDs are needed.
pub(crate) const X_Z_U_STAR_TAGS: &[Tag] = &[
    Tag(0x0008, 0x1140), // ReferencedImageSequence
    Tag(0x0008, 0x2112), // SourceImageSequence
];

/// P: pseudonymize through the correspondence table (also covers AccessionNumber).
pub(crate) const P_TAGS: &[Tag] = &[
    Tag(0x0010, 0x0020), // PatientID
];

/// Repeating groups removed by the profile.
pub(crate) const X_GROUPS: &[RepeatingGroup] = &[
    RepeatingGroup::new(0x5000, 0x0000, 0xFF00, 0x0000), // (50xx,xxxx) curve data
    RepeatingGroup::new(0x6000, 0x3000, 0xFF00, 0xFFFF), // (60xx,3000) OverlayData
    RepeatingGroup::new(0x6000, 0x4000, 0xFF00, 0xFFFF), // (60xx,4000) OverlayComments
];

fn groups() -> [(&'static [Tag], Action); 10] {
    [
        (D_TAGS, Action::Replace),
        (Z_TAGS, Action::Empty),
        (X_TAGS, Action::Delete),
        (U_TAGS, Action::ReplaceUID),
        (Z_D_TAGS, Action::EmptyOrReplace),
        (X_Z_TAGS, Action::DeleteOrEmpty),
        (X_D_TAGS, Action::DeleteOrReplace),
        (X_Z_D_TAGS, Action::DeleteOrEmptyOrReplace),
        (X_Z_U_STAR_TAGS, Action::DeleteOrEmptyOrReplaceUID),
        (P_TAGS, Action::PseudonymizeWithCorrespondence),
    ]
}

/// Builds the default rule table. Pure, performs no I/O.
pub fn build_default_table() -> RuleTable {
    let mut table = RuleTable::new();
    for (tags, action) in groups() {
        for tag in tags {
            table.insert(*tag, action.clone());
        }
    }
    for group in X_GROUPS {
        table.insert(*group, Action::Delete);
    }
    table
}
