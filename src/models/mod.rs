pub mod media_types;
pub mod record_types;
pub mod scan_types;
