//! CSV export serializer.
//!
//! Produces UTF-8 text with a leading byte-order mark so spreadsheet
//! applications pick the right encoding, a fixed header row, and one row
//! per particle. Numbers are written with exactly four decimals and rows
//! end with `\r\n`.

use std::fmt::Write;

use granule_pipeline::Particle;

/// UTF-8 byte-order mark.
pub const BOM: char = '\u{feff}';

/// Column names, in order.
pub const CSV_HEADER: [&str; 4] = ["index", "perimeter", "area", "circularity"];

const LINE_END: &str = "\r\n";

/// Serialize `particles` as a CSV document.
#[must_use]
pub fn to_csv(particles: &[Particle]) -> String {
    let mut out = String::with_capacity(64 + particles.len() * 40);
    out.push(BOM);
    out.push_str(&CSV_HEADER.join(","));
    out.push_str(LINE_END);
    for p in particles {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{},{:.4},{:.4},{:.4}{LINE_END}",
            p.index, p.perimeter, p.area, p.circularity
        );
    }
    out
}
