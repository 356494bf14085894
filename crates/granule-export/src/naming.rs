//! Default export file names derived from the source image name.

use std::path::Path;

/// `<stem>_processed<.ext>`, keeping the source's extension (if any).
///
/// Only the file name is returned; any directory part of `source` is
/// dropped.
#[must_use]
pub fn default_image_name(source: &str) -> String {
    let path = Path::new(source);
    let stem = stem_of(path);
    match path.extension() {
        Some(ext) => format!("{stem}_processed.{}", ext.to_string_lossy()),
        None => format!("{stem}_processed"),
    }
}

/// `<stem>_processed.csv`.
#[must_use]
pub fn default_csv_name(source: &str) -> String {
    format!("{}_processed.csv", stem_of(Path::new(source)))
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned())
}
