//! imgstack-export: Pure output serializers (sans-IO)
//!
//! Turns composites into bytes: raster encoding (PNG, JPEG) and zip
//! packaging of several encoded outputs. Nothing here touches the
//! filesystem.

pub mod archive;
pub mod raster;

pub use archive::{
    ArchiveEntry, DEFAULT_ARCHIVE_NAME, DEFAULT_IMAGE_NAME, output_name, read_zip, to_zip,
    unique_names,
};
pub use raster::{OutputFormat, encode};

/// Errors that can occur while serializing output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The image encoder failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// The zip writer or reader failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Writing or reading archive contents failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two archive entries share a name.
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// The image has no pixels and cannot be encoded.
    #[error("cannot encode an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
}
