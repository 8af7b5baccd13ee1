use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::FileMetaTable;

pub(crate) const SOP_INSTANCE_UID: &str = "2.25.137038125948464847900039011591283709926";

pub(crate) fn make_file_meta() -> FileMetaTable {
    FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid(SOP_INSTANCE_UID)
        .transfer_syntax("1.2.840.10008.1.2.1")
        .build()
        .unwrap()
}
