pub mod domain;
pub mod status;
