//! # Reporter Module
//!
//! Writes what a run found.
//!
//! ## Outputs
//! 1. **mapping.csv** - one row per edited photo, in enumeration order:
//!    `edited,raw_match,distance,status,copied_to`
//! 2. **Run report** - counts for the console or as JSON

mod mapping;
mod summary;

pub use mapping::{
    mapping_rows, write_mapping_csv, write_mapping_file, MappingRow, MAPPING_FILE_NAME,
};
pub use summary::RunReport;
