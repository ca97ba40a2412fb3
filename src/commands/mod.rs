pub mod clean;
pub mod status;
