//! Registry module - schemas, records and the CSV file store

pub mod record;
pub mod schema;
pub mod store;

pub use record::{
    form_from_json, AvsRecord, FormSubmission, RegistryRecord, TemplateRecord, YesNo,
    INTERPRETATION_OPTIONS, PLAN_OPTIONS, SEX_OPTIONS,
};
pub use schema::{ColumnKind, ColumnSpec, SchemaVariant};
pub use store::{
    append_record, default_export_path, ensure_dataset, export_registry, initialize_registry,
    load_registry, submit_form, write_atomically, RegistryConfig,
};
