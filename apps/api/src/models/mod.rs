pub mod application;
pub mod prediction;
