pub mod account_forms;
pub mod comments;
pub mod field_path;
pub mod models;
pub mod registry;
pub mod status;
pub mod validation;
