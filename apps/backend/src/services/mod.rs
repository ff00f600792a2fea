pub mod import;
pub mod learning;
