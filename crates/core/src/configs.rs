//! Configuration file formats

pub mod project;
pub mod tasks;
