pub mod auth;
pub mod browse;
pub mod exams;
pub mod favorites;
pub mod learning;
pub mod quiz;
