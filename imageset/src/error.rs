use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read dataset metadata '{path}'")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset metadata '{path}'")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_xml_rs::Error,
    },

    #[error("invalid box in image entry '{file}': {reason}")]
    InvalidBox { file: String, reason: String },

    #[error("failed to decode image '{path}'")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image '{path}' carries {count} non-ignored boxes, \
         but landmark datasets allow at most one per image"
    )]
    MultipleObjectBoxes { path: PathBuf, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
