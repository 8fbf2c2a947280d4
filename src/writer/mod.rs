//! Component 3 – output: version 2 text files and JSON dumps.
pub mod bundle;
pub mod json;
