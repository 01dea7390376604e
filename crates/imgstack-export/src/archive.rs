//! Zip packaging of encoded outputs.
//!
//! Entries are written in the order given, deflate-compressed. Entry
//! names must be unique within one archive; [`unique_names`] resolves
//! collisions between inputs that share a file name.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::ExportError;
use crate::raster::OutputFormat;

/// Name used for a single composite inside an archive.
pub const DEFAULT_IMAGE_NAME: &str = "processed_image.png";

/// Name used for a downloaded archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "processed_images.zip";

/// One file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path of the entry within the archive.
    pub name: String,
    /// Entry contents.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Package `entries` into a deflate-compressed zip archive.
///
/// # Errors
///
/// Returns [`ExportError::DuplicateEntry`] if two entries share a name.
/// Returns [`ExportError::Archive`] or [`ExportError::Io`] if writing
/// the archive fails.
pub fn to_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ExportError> {
    let mut seen = HashSet::with_capacity(entries.len());
    if let Some(duplicate) = entries.iter().find(|e| !seen.insert(e.name.as_str())) {
        return Err(ExportError::DuplicateEntry(duplicate.name.clone()));
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Read every entry of a zip archive, in archive order.
///
/// # Errors
///
/// Returns [`ExportError::Archive`] if the bytes are not a readable zip,
/// or [`ExportError::Io`] if an entry cannot be decompressed.
pub fn read_zip(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ExportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        entries.push(ArchiveEntry::new(file.name(), contents));
    }
    Ok(entries)
}

/// Make every name unique by appending `-1`, `-2`, ... to the stem of
/// repeats, in order of appearance.
///
/// ```
/// use imgstack_export::archive::unique_names;
///
/// let names = unique_names(["a.png", "b.png", "a.png", "a.png"]);
/// assert_eq!(names, ["a.png", "b.png", "a-1.png", "a-2.png"]);
/// ```
#[must_use]
pub fn unique_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut result = Vec::new();
    for name in names {
        let name = name.as_ref();
        let mut candidate = name.to_string();
        let mut n = 1u32;
        while taken.contains(&candidate) {
            candidate = with_suffix(name, &format!("-{n}"));
            n += 1;
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

/// Output file name for a result derived from `source_name`.
///
/// The directory part and extension of the source are dropped, `suffix`
/// is appended to the stem, and the format's extension is added.
///
/// ```
/// use imgstack_export::OutputFormat;
/// use imgstack_export::archive::output_name;
///
/// assert_eq!(output_name("shots/cat.jpeg", "_stacked", OutputFormat::Png), "cat_stacked.png");
/// ```
#[must_use]
pub fn output_name(source_name: &str, suffix: &str, format: OutputFormat) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{stem}{suffix}.{}", format.extension())
}

/// Insert `suffix` before the extension of `name`.
fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}{suffix}.{ext}"),
        _ => format!("{name}{suffix}"),
    }
}
