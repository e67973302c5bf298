use crate::{common::*, metadata::BoxRecord};

/// Default box-area threshold for [`DatasetSource::shrink_big_images`],
/// in square pixels.
pub const DEFAULT_BOX_AREA_THRESH: f64 = 150.0 * 150.0;

/// Selects which boxes of a metadata file take part in a load, and how
/// oversized images are treated.
///
/// A `DatasetSource` is an immutable configuration value. Every `with`
/// style call consumes the receiver and returns a new value, so options
/// chain without in-place mutation:
///
/// ```
/// use imageset::DatasetSource;
///
/// let source = DatasetSource::new("faces.xml")
///     .boxes_match_label("face")
///     .skip_empty_images()
///     .shrink_big_images();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSource {
    filename: PathBuf,
    labels: BTreeSet<String>,
    skip_empty_images: bool,
    boxes_have_parts: bool,
    box_area_thresh: f64,
}

impl DatasetSource {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            labels: BTreeSet::new(),
            skip_empty_images: false,
            boxes_have_parts: false,
            box_area_thresh: f64::INFINITY,
        }
    }

    /// Restrict the load to boxes whose label is in the allow-set.
    /// Multiple calls accumulate; no call at all accepts every label.
    pub fn boxes_match_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Drop images on which no non-ignored box survives filtering.
    pub fn skip_empty_images(mut self) -> Self {
        self.skip_empty_images = true;
        self
    }

    /// Restrict the load to boxes annotated with at least one part.
    pub fn boxes_have_parts(mut self) -> Self {
        self.boxes_have_parts = true;
        self
    }

    /// Downsample images until their smallest kept box no longer safely
    /// exceeds [`DEFAULT_BOX_AREA_THRESH`].
    pub fn shrink_big_images(self) -> Self {
        self.shrink_big_images_to(DEFAULT_BOX_AREA_THRESH)
    }

    /// Same as [`Self::shrink_big_images`] with an explicit area
    /// threshold in square pixels.
    pub fn shrink_big_images_to(mut self, box_area_thresh: f64) -> Self {
        self.box_area_thresh = box_area_thresh;
        self
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn should_skip_empty_images(&self) -> bool {
        self.skip_empty_images
    }

    pub fn should_boxes_have_parts(&self) -> bool {
        self.boxes_have_parts
    }

    pub fn box_area_thresh(&self) -> f64 {
        self.box_area_thresh
    }

    pub fn selected_labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// The filtering predicate: a box is loaded iff it has parts when
    /// parts are required, and its label is allowed.
    pub fn should_load_box(&self, box_: &BoxRecord) -> bool {
        if self.boxes_have_parts && !box_.has_parts() {
            return false;
        }
        if self.labels.is_empty() {
            return true;
        }
        match &box_.label {
            Some(label) => self.labels.contains(label),
            None => false,
        }
    }
}

impl From<PathBuf> for DatasetSource {
    fn from(filename: PathBuf) -> Self {
        Self::new(filename)
    }
}

impl From<&Path> for DatasetSource {
    fn from(filename: &Path) -> Self {
        Self::new(filename)
    }
}
