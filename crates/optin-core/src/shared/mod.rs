pub mod error;
pub mod indexes;
