//! The load pipeline: metadata in, images and annotations out.
//!
//! Three entry points share one internal pipeline and differ only in the
//! output representation: plain rectangles, labeled detector boxes, or
//! landmark detections with an optional rotation augmentation.

use crate::{
    common::*,
    metadata::{BoxRecord, DatasetMetadata},
    pyramid::PyramidDown,
    record::{LabeledBox, LandmarkDetection},
    rotate::rotate_image,
    selector::DatasetSource,
};

/// Images with their kept rectangles; ignored rectangles are reported in
/// a separate parallel collection.
#[derive(Debug)]
pub struct RectDataset {
    pub images: Vec<DynamicImage>,
    pub boxes: Vec<Vec<Rect<R64>>>,
    pub ignored: Vec<Vec<Rect<R64>>>,
}

/// Images with kept and ignored boxes merged into one sequence per image,
/// each carrying its ignore marker and label.
#[derive(Debug)]
pub struct LabeledDataset {
    pub images: Vec<DynamicImage>,
    pub boxes: Vec<Vec<LabeledBox>>,
}

/// Images with at most one landmark detection each, plus the part
/// vocabulary the detections are indexed against.
#[derive(Debug)]
pub struct LandmarkDataset {
    pub images: Vec<DynamicImage>,
    pub detections: Vec<Vec<LandmarkDetection>>,
    pub ignored: Vec<Vec<Rect<R64>>>,
    /// Part names in vocabulary order; `detections[i][0].parts[k]` is the
    /// location of `parts_list[k]`.
    pub parts_list: Vec<String>,
}

/// Synthetic rotation augmentation for [`load_landmark_dataset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAugment {
    pub samples_per_side: usize,
    pub max_angle_degrees: f64,
}

impl RotationAugment {
    pub fn new(samples_per_side: usize, max_angle_degrees: f64) -> Self {
        Self {
            samples_per_side,
            max_angle_degrees,
        }
    }

    /// The sampled angles in radians: `samples_per_side` negative angles
    /// sweeping up from `-max_angle`, then `samples_per_side` positive
    /// ones sweeping up to `+max_angle`. Zero is never included.
    pub fn angles(&self) -> Vec<f64> {
        let n = self.samples_per_side;
        if n == 0 {
            return Vec::new();
        }
        let slice = self.max_angle_degrees.to_radians() / n as f64;

        let negative = (0..n).map(|k| -slice * (n - k) as f64);
        let positive = (0..n).map(|k| slice * (k + 1) as f64);
        negative.chain(positive).collect()
    }
}

/// Load a dataset as plain rectangles.
///
/// Returns the kept (non-ignored) rectangles per image; rectangles whose
/// annotation is marked `ignore` end up in the parallel `ignored` lists.
pub fn load_rect_dataset(source: impl Into<DatasetSource>) -> Result<RectDataset> {
    let source = source.into();
    let data = DatasetMetadata::open(source.filename())?;
    let base_dir = metadata_dir(&source);
    let box_area_thresh = source.box_area_thresh();

    let mut images = Vec::new();
    let mut boxes = Vec::new();
    let mut ignored = Vec::new();

    for entry in filter_images(&data, &source, &base_dir) {
        let image = decode_image(&entry.path)?;

        let mut rects: Vec<Rect<R64>> = entry.kept().map(|box_| box_.rect).collect();
        let mut ignored_rects: Vec<Rect<R64>> = entry.ignored().map(|box_| box_.rect).collect();

        let image = match entry.min_kept_area {
            Some(min_area) => shrink_to_threshold(image, min_area, box_area_thresh, |pyr| {
                for rect in &mut rects {
                    *rect = pyr.rect_down(rect);
                }
                for rect in &mut ignored_rects {
                    *rect = pyr.rect_down(rect);
                }
            }),
            None => image,
        };

        images.push(image);
        boxes.push(rects);
        ignored.push(ignored_rects);
    }

    info!(
        "loaded {} images from '{}'",
        images.len(),
        source.filename().display()
    );
    Ok(RectDataset {
        images,
        boxes,
        ignored,
    })
}

/// Load a dataset as labeled detector boxes, kept and ignored merged in
/// metadata file order.
pub fn load_labeled_dataset(source: impl Into<DatasetSource>) -> Result<LabeledDataset> {
    let source = source.into();
    let data = DatasetMetadata::open(source.filename())?;
    let base_dir = metadata_dir(&source);
    let box_area_thresh = source.box_area_thresh();

    let mut images = Vec::new();
    let mut boxes = Vec::new();

    for entry in filter_images(&data, &source, &base_dir) {
        let image = decode_image(&entry.path)?;

        let mut labeled: Vec<LabeledBox> = entry
            .survivors
            .iter()
            .map(|box_| LabeledBox {
                rect: box_.rect,
                ignore: box_.ignore,
                label: box_.label.clone(),
            })
            .collect();

        let image = match entry.min_kept_area {
            Some(min_area) => shrink_to_threshold(image, min_area, box_area_thresh, |pyr| {
                for box_ in &mut labeled {
                    box_.rect = pyr.rect_down(&box_.rect);
                }
            }),
            None => image,
        };

        images.push(image);
        boxes.push(labeled);
    }

    info!(
        "loaded {} images from '{}'",
        images.len(),
        source.filename().display()
    );
    Ok(LabeledDataset { images, boxes })
}

/// Load a dataset as landmark detections.
///
/// The part vocabulary is the lexicographically ordered union of the part
/// names on every box accepted by the selector; every detection carries one
/// slot per vocabulary part, `None` when the part is absent on that box.
///
/// At most one non-ignored box may survive filtering on any image;
/// violations fail with [`Error::MultipleObjectBoxes`]. With `augment`,
/// every annotated image is followed by `2 * samples_per_side` rotated
/// copies in ascending angle order.
pub fn load_landmark_dataset(
    source: impl Into<DatasetSource>,
    augment: Option<RotationAugment>,
) -> Result<LandmarkDataset> {
    let source = source.into();
    let data = DatasetMetadata::open(source.filename())?;
    let base_dir = metadata_dir(&source);
    let box_area_thresh = source.box_area_thresh();

    let parts_list = collect_part_vocabulary(&data, &source);
    let parts_index: IndexMap<String, usize> = parts_list
        .iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), index))
        .collect();

    let angles = augment.map(|augment| augment.angles()).unwrap_or_default();

    let mut images = Vec::new();
    let mut detections = Vec::new();
    let mut ignored = Vec::new();

    for entry in filter_images(&data, &source, &base_dir) {
        let kept: Vec<&BoxRecord> = entry.kept().collect();
        if kept.len() > 1 {
            return Err(Error::MultipleObjectBoxes {
                path: entry.path.clone(),
                count: kept.len(),
            });
        }
        let base_ignored: Vec<Rect<R64>> = entry.ignored().map(|box_| box_.rect).collect();

        let image = decode_image(&entry.path)?;

        let box_ = match kept.first() {
            Some(box_) => *box_,
            None => {
                // nothing to detect or augment, keep the image as-is
                images.push(image);
                detections.push(Vec::new());
                ignored.push(base_ignored);
                continue;
            }
        };

        let base_det = LandmarkDetection {
            rect: box_.rect,
            parts: part_slots(box_, &parts_index),
        };
        let min_area = box_.rect.area();
        let center = Point::new(
            r64((image.width() as f64 - 1.0) / 2.0),
            r64((image.height() as f64 - 1.0) / 2.0),
        );

        // rotated frames come from the unshrunk source image
        let rotated_images: Vec<DynamicImage> = angles
            .iter()
            .map(|&angle| rotate_image(&image, angle))
            .collect();

        let mut det = base_det.clone();
        let mut ignored_rects = base_ignored.clone();
        let image = shrink_to_threshold(image, min_area, box_area_thresh, |pyr| {
            map_detection_down(&mut det, pyr);
            for rect in &mut ignored_rects {
                *rect = pyr.rect_down(rect);
            }
        });
        images.push(image);
        detections.push(vec![det]);
        ignored.push(ignored_rects);

        for (&angle, rotated) in angles.iter().zip(rotated_images) {
            let mut det = base_det.clone();
            for part in det.parts.iter_mut().flatten() {
                *part = part.rotate_about(center, r64(angle));
            }
            let mut ignored_rects = base_ignored.clone();
            let rotated = shrink_to_threshold(rotated, min_area, box_area_thresh, |pyr| {
                map_detection_down(&mut det, pyr);
                for rect in &mut ignored_rects {
                    *rect = pyr.rect_down(rect);
                }
            });
            images.push(rotated);
            detections.push(vec![det]);
            ignored.push(ignored_rects);
        }
    }

    info!(
        "loaded {} images ({} part names) from '{}'",
        images.len(),
        parts_list.len(),
        source.filename().display()
    );
    Ok(LandmarkDataset {
        images,
        detections,
        ignored,
        parts_list,
    })
}

/// One metadata image entry after filtering, with the resolved on-disk
/// path and the boxes that passed the selector, still in file order.
struct FilteredImage<'a> {
    path: PathBuf,
    survivors: Vec<&'a BoxRecord>,
    min_kept_area: Option<R64>,
}

impl FilteredImage<'_> {
    fn kept(&self) -> impl Iterator<Item = &BoxRecord> {
        self.survivors
            .iter()
            .copied()
            .filter(|box_| !box_.ignore)
    }

    fn ignored(&self) -> impl Iterator<Item = &BoxRecord> {
        self.survivors.iter().copied().filter(|box_| box_.ignore)
    }
}

fn filter_images<'a>(
    data: &'a DatasetMetadata,
    source: &DatasetSource,
    base_dir: &Path,
) -> Vec<FilteredImage<'a>> {
    data.images
        .iter()
        .filter_map(|record| {
            let survivors: Vec<&BoxRecord> = record
                .boxes
                .iter()
                .filter(|box_| source.should_load_box(box_))
                .collect();

            let min_kept_area = survivors
                .iter()
                .filter(|box_| !box_.ignore)
                .map(|box_| box_.rect.area())
                .min();

            if source.should_skip_empty_images() && min_kept_area.is_none() {
                debug!(
                    "skipping '{}': no box survived filtering",
                    record.filename.display()
                );
                return None;
            }

            Some(FilteredImage {
                path: resolve_image_path(base_dir, &record.filename),
                survivors,
                min_kept_area,
            })
        })
        .collect()
}

/// The directory image paths are resolved against. Relative paths in a
/// metadata file are relative to the file's own directory.
fn metadata_dir(source: &DatasetSource) -> PathBuf {
    source
        .filename()
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_owned()
}

fn resolve_image_path(base_dir: &Path, filename: &Path) -> PathBuf {
    if filename.is_absolute() {
        filename.to_owned()
    } else {
        base_dir.join(filename)
    }
}

fn decode_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::ImageDecode {
        path: path.to_owned(),
        source,
    })
}

/// Exhausts 2x pyramid reductions, then 1.5x reductions, for as long as
/// the smallest kept box would still exceed the area threshold after one
/// more step. `map_coords` receives each applied pyramid so the caller
/// can map its coordinates alongside the image.
fn shrink_to_threshold(
    mut image: DynamicImage,
    mut min_area: R64,
    box_area_thresh: f64,
    mut map_coords: impl FnMut(&PyramidDown),
) -> DynamicImage {
    let half = PyramidDown::new(2);
    let half_area = r64(0.25);
    while (min_area * half_area).raw() > box_area_thresh {
        image = half.downsample(&image);
        min_area *= half_area;
        map_coords(&half);
    }

    let two_thirds = PyramidDown::new(3);
    let two_thirds_area = r64(4.0 / 9.0);
    while (min_area * two_thirds_area).raw() > box_area_thresh {
        image = two_thirds.downsample(&image);
        min_area *= two_thirds_area;
        map_coords(&two_thirds);
    }

    image
}

/// Union of part names over every accepted box, in lexicographic order.
fn collect_part_vocabulary(data: &DatasetMetadata, source: &DatasetSource) -> Vec<String> {
    let all_parts: BTreeSet<&str> = data
        .images
        .iter()
        .flat_map(|record| &record.boxes)
        .filter(|box_| source.should_load_box(box_))
        .flat_map(|box_| box_.parts.keys())
        .map(|name| name.as_str())
        .collect();

    all_parts.into_iter().map(|name| name.to_owned()).collect()
}

fn part_slots(
    box_: &BoxRecord,
    parts_index: &IndexMap<String, usize>,
) -> Vec<Option<Point<R64>>> {
    let mut slots = vec![None; parts_index.len()];
    for (name, &point) in &box_.parts {
        if let Some(&index) = parts_index.get(name.as_str()) {
            slots[index] = Some(point);
        }
    }
    slots
}

fn map_detection_down(det: &mut LandmarkDetection, pyr: &PyramidDown) {
    det.rect = pyr.rect_down(&det.rect);
    for part in det.parts.iter_mut().flatten() {
        *part = pyr.point_down(part);
    }
}
