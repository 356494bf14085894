//! granule-export: Pure export serializers (sans-IO)
//!
//! Turns analysis results into file payloads: a CSV table of particle
//! measurements and an encoded copy of the annotated image. Also derives
//! the default file names offered to the operator. Writing the bytes is
//! the caller's job.

pub mod csv;
pub mod naming;
pub mod raster;

pub use csv::{CSV_HEADER, to_csv};
pub use naming::{default_csv_name, default_image_name};
pub use raster::{ExportError, encode_image};
