pub mod admin_schema;
pub mod config;
pub mod image_storage;
pub mod variant_intake;
