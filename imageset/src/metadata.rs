//! The XML image-dataset metadata format.
//!
//! A metadata file lists images by path, each with zero or more annotated
//! boxes. A box has a rectangle, an optional `ignore` marker, an optional
//! label and optional named landmark parts:
//!
//! ```xml
//! <dataset>
//!   <name>faces</name>
//!   <images>
//!     <image file='img1.png'>
//!       <box top='10' left='10' width='60' height='60'>
//!         <label>face</label>
//!         <part name='left_eye' x='30' y='30'/>
//!       </box>
//!     </image>
//!   </images>
//! </dataset>
//! ```

use crate::common::*;
use serde::Deserialize;

/// A parsed metadata file.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetadata {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub images: Vec<ImageRecord>,
}

/// One image entry: a file path and its annotations, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Image path as written in the metadata file, possibly relative to
    /// the metadata file's directory.
    pub filename: PathBuf,
    pub boxes: Vec<BoxRecord>,
}

/// One annotated region of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxRecord {
    pub rect: Rect<R64>,
    pub ignore: bool,
    pub label: Option<String>,
    /// Named landmark points, sorted by part name.
    pub parts: BTreeMap<String, Point<R64>>,
}

impl BoxRecord {
    pub fn has_parts(&self) -> bool {
        !self.parts.is_empty()
    }
}

impl DatasetMetadata {
    /// Read and parse a metadata file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::MetadataRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_xml_str(&text, path)
    }

    /// Parse metadata from an XML string. `origin` is used in error
    /// messages only.
    pub fn from_xml_str(text: &str, origin: impl AsRef<Path>) -> Result<Self> {
        let raw: RawDataset =
            serde_xml_rs::from_str(text).map_err(|source| Error::MetadataParse {
                path: origin.as_ref().to_owned(),
                source,
            })?;

        let RawDataset {
            name,
            comment,
            images,
        } = raw;

        let images: Vec<_> = images
            .image
            .into_iter()
            .map(|image| {
                let RawImage { file, boxes } = image;
                let boxes: Vec<_> = boxes
                    .into_iter()
                    .map(|box_| convert_box(box_, &file))
                    .try_collect()?;
                Ok(ImageRecord {
                    filename: PathBuf::from(file),
                    boxes,
                })
            })
            .try_collect()?;

        Ok(Self {
            name,
            comment,
            images,
        })
    }
}

fn convert_box(raw: RawBox, file: &str) -> Result<BoxRecord> {
    let RawBox {
        top,
        left,
        width,
        height,
        ignore,
        label,
        parts,
    } = raw;

    let rect = Rect::try_from_tlhw([
        r64(top as f64),
        r64(left as f64),
        r64(height as f64),
        r64(width as f64),
    ])
    .map_err(|err| Error::InvalidBox {
        file: file.to_owned(),
        reason: err.to_string(),
    })?;

    let parts: BTreeMap<_, _> = parts
        .into_iter()
        .map(|part| {
            let RawPart { name, x, y } = part;
            (name, Point::new(r64(x as f64), r64(y as f64)))
        })
        .collect();

    Ok(BoxRecord {
        rect,
        ignore: ignore.unwrap_or(0) != 0,
        label,
        parts,
    })
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    name: Option<String>,
    comment: Option<String>,
    images: RawImages,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    #[serde(rename = "image", default)]
    image: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    file: String,
    #[serde(rename = "box", default)]
    boxes: Vec<RawBox>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    top: i64,
    left: i64,
    width: i64,
    height: i64,
    #[serde(default)]
    ignore: Option<u8>,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "part", default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    name: String,
    x: i64,
    y: i64,
}
