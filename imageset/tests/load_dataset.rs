use approx::assert_abs_diff_eq;
use image::{DynamicImage, Rgb, RgbImage};
use imageset::{
    load_labeled_dataset, load_landmark_dataset, load_rect_dataset, DatasetSource, Error,
    RotationAugment,
};
use itertools::Itertools as _;
use noisy_float::prelude::*;
use region::Point;
use std::fs;
use tempfile::TempDir;

const METADATA: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<dataset>
  <name>fixture</name>
  <images>
    <image file='imgs/img_a.png'>
      <box top='10' left='10' width='120' height='120'>
        <label>face</label>
        <part name='left_eye' x='40' y='40'/>
        <part name='right_eye' x='100' y='40'/>
      </box>
      <box top='0' left='0' width='20' height='20' ignore='1'>
        <label>face</label>
      </box>
    </image>
    <image file='img_b.png'>
      <box top='5' left='5' width='30' height='30'>
        <label>car</label>
      </box>
    </image>
    <image file='img_c.png'/>
  </images>
</dataset>
"#;

fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
    }
    DynamicImage::ImageRgb8(img)
}

/// Writes the fixture dataset: metadata plus three images, one of them
/// in a subdirectory to exercise relative path resolution.
fn write_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("imgs")).unwrap();
    gradient_image(240, 240)
        .save(root.join("imgs").join("img_a.png"))
        .unwrap();
    gradient_image(64, 64).save(root.join("img_b.png")).unwrap();
    gradient_image(32, 32).save(root.join("img_c.png")).unwrap();
    fs::write(root.join("dataset.xml"), METADATA).unwrap();
    dir
}

fn fixture_source(dir: &TempDir) -> DatasetSource {
    DatasetSource::new(dir.path().join("dataset.xml"))
}

#[test]
fn rect_dataset_keeps_outputs_parallel() {
    let dir = write_fixture();
    let dataset = load_rect_dataset(fixture_source(&dir)).unwrap();

    assert_eq!(dataset.images.len(), 3);
    assert_eq!(dataset.boxes.len(), 3);
    assert_eq!(dataset.ignored.len(), 3);

    assert_eq!(dataset.boxes[0].len(), 1);
    assert_eq!(dataset.ignored[0].len(), 1);
    assert_eq!(dataset.boxes[1].len(), 1);
    assert!(dataset.ignored[1].is_empty());
    assert!(dataset.boxes[2].is_empty());

    // outputs follow metadata file order
    assert_eq!(dataset.images[0].width(), 240);
    assert_eq!(dataset.images[1].width(), 64);
    assert_eq!(dataset.images[2].width(), 32);
}

#[test]
fn skip_empty_images_drops_unannotated_entries() {
    let dir = write_fixture();

    let with_empty = load_rect_dataset(fixture_source(&dir)).unwrap();
    assert!(with_empty.boxes.iter().any(|boxes| boxes.is_empty()));

    let skipped = load_rect_dataset(fixture_source(&dir).skip_empty_images()).unwrap();
    assert_eq!(skipped.images.len(), 2);
    assert!(skipped.boxes.iter().all(|boxes| !boxes.is_empty()));
}

#[test]
fn label_allow_set_restricts_the_load() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images();
    let dataset = load_rect_dataset(source).unwrap();

    // img_b's 'car' box is filtered, so img_b is skipped entirely
    assert_eq!(dataset.images.len(), 1);
    assert_eq!(dataset.images[0].width(), 240);
}

#[test]
fn oversized_boxes_trigger_exactly_one_halving() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images()
        .shrink_big_images_to(2500.0);
    let dataset = load_rect_dataset(source).unwrap();

    // 120x120 kept box: 14400/4 = 3600 > 2500 runs the 2x step once,
    // then 3600/4 = 900 and 3600*4/9 = 1600 both stop.
    let image = &dataset.images[0];
    assert_eq!((image.width(), image.height()), (120, 120));

    let rect = &dataset.boxes[0][0];
    assert_abs_diff_eq!(rect.area().raw(), 3600.0);
    assert_abs_diff_eq!(rect.t().raw(), 5.0);
    assert_abs_diff_eq!(rect.l().raw(), 5.0);

    // ignored rectangles are mapped through the same reduction
    let ignored = &dataset.ignored[0][0];
    assert_abs_diff_eq!(ignored.area().raw(), 100.0);

    // shrink idempotence: no further step of either rate would trigger
    assert!(rect.area().raw() * 0.25 <= 2500.0);
    assert!(rect.area().raw() * 4.0 / 9.0 <= 2500.0);
}

#[test]
fn oversized_boxes_shrink_by_two_thirds_when_halving_overshoots() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images()
        .shrink_big_images_to(6000.0);
    let dataset = load_rect_dataset(source).unwrap();

    // halving the 120x120 kept box would overshoot (14400/4 = 3600 is
    // not > 6000), so the 2x loop never runs and the 1.5x loop takes
    // one step (14400 * 4/9 = 6400 > 6000, then 2844 stops).
    let image = &dataset.images[0];
    assert_eq!((image.width(), image.height()), (160, 160));

    let rect = &dataset.boxes[0][0];
    assert_abs_diff_eq!(rect.area().raw(), 6400.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rect.t().raw(), 20.0 / 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rect.l().raw(), 20.0 / 3.0, epsilon = 1e-9);

    // ignored rectangles are mapped through the same reduction
    let ignored = &dataset.ignored[0][0];
    assert_abs_diff_eq!(ignored.area().raw(), 400.0 * 4.0 / 9.0, epsilon = 1e-9);

    // shrink idempotence: no further step of either rate would trigger
    assert!(rect.area().raw() * 0.25 <= 6000.0);
    assert!(rect.area().raw() * 4.0 / 9.0 <= 6000.0);
}

#[test]
fn landmark_shrink_maps_parts_with_the_image() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images()
        .shrink_big_images_to(2500.0);
    let dataset = load_landmark_dataset(source, None).unwrap();

    // one 2x reduction, as in the rect-dataset case
    let image = &dataset.images[0];
    assert_eq!((image.width(), image.height()), (120, 120));

    let det = &dataset.detections[0][0];
    assert_abs_diff_eq!(det.rect.area().raw(), 3600.0, epsilon = 1e-9);

    // every landmark point is halved along with the frame
    let left = det.part(0).unwrap();
    let right = det.part(1).unwrap();
    assert_abs_diff_eq!(left.x.raw(), 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(left.y.raw(), 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(right.x.raw(), 50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(right.y.raw(), 20.0, epsilon = 1e-9);

    // the parallel ignored rectangle shrinks too
    assert_abs_diff_eq!(dataset.ignored[0][0].area().raw(), 100.0, epsilon = 1e-9);
}

#[test]
fn rotated_copies_shrink_like_their_source() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images()
        .shrink_big_images_to(2500.0);
    let augment = RotationAugment::new(1, 30.0);
    let dataset = load_landmark_dataset(source, Some(augment)).unwrap();

    assert_eq!(dataset.images.len(), 3);

    // every output frame, rotated or not, lands at the same reduced size
    for image in &dataset.images {
        assert_eq!((image.width(), image.height()), (120, 120));
    }

    // rotation happens in the unshrunk frame, then the same 2x
    // reduction applies to the copy: expected part locations are
    // rotate-about-center followed by a halving.
    let center = Point::new(r64(239.0 / 2.0), r64(239.0 / 2.0));
    let angles = [(-30.0f64).to_radians(), 30.0f64.to_radians()];
    let source_det = &dataset.detections[0][0];

    for (&angle, dets) in angles.iter().zip(&dataset.detections[1..]) {
        let det = &dets[0];
        assert_eq!(det.rect, source_det.rect);

        for (index, point) in det.present_parts() {
            let original = Point::new(
                r64(if index == 0 { 40.0 } else { 100.0 }),
                r64(40.0),
            );
            let expected = original.rotate_about(center, r64(angle)) * r64(0.5);
            assert_abs_diff_eq!(point.x.raw(), expected.x.raw(), epsilon = 1e-9);
            assert_abs_diff_eq!(point.y.raw(), expected.y.raw(), epsilon = 1e-9);
        }
    }

    // each rotated copy carries its own mapped ignored list
    for ignored in &dataset.ignored {
        assert_eq!(ignored.len(), 1);
        assert_abs_diff_eq!(ignored[0].area().raw(), 100.0, epsilon = 1e-9);
    }
}

#[test]
fn labeled_dataset_merges_kept_and_ignored_in_file_order() {
    let dir = write_fixture();
    let dataset = load_labeled_dataset(fixture_source(&dir)).unwrap();

    let boxes = &dataset.boxes[0];
    assert_eq!(boxes.len(), 2);
    assert!(!boxes[0].ignore);
    assert!(boxes[1].ignore);
    assert_eq!(boxes[0].label.as_deref(), Some("face"));
    assert_eq!(boxes[1].label.as_deref(), Some("face"));
}

#[test]
fn part_vocabulary_is_deterministic_and_sorted() {
    let dir = write_fixture();

    let first = load_landmark_dataset(fixture_source(&dir), None).unwrap();
    let second = load_landmark_dataset(fixture_source(&dir), None).unwrap();

    assert_eq!(first.parts_list, ["left_eye", "right_eye"]);
    assert_eq!(first.parts_list, second.parts_list);
}

#[test]
fn landmark_detections_pad_missing_parts() {
    let dir = write_fixture();
    let dataset = load_landmark_dataset(fixture_source(&dir), None).unwrap();

    // img_a: both parts present
    let det = &dataset.detections[0][0];
    assert_eq!(det.num_parts(), 2);
    assert_eq!(det.part(0).unwrap(), Point::new(r64(40.0), r64(40.0)));
    assert_eq!(det.part(1).unwrap(), Point::new(r64(100.0), r64(40.0)));

    // img_b's box has no parts: every slot is padded
    let det = &dataset.detections[1][0];
    assert_eq!(det.num_parts(), 2);
    assert!(det.part(0).is_none());
    assert!(det.part(1).is_none());

    // img_c has no boxes at all but stays in the outputs
    assert!(dataset.detections[2].is_empty());
    assert_eq!(dataset.images.len(), dataset.detections.len());
    assert_eq!(dataset.images.len(), dataset.ignored.len());
}

#[test]
fn rotation_augmentation_appends_two_n_copies_per_image() {
    let dir = write_fixture();
    let source = fixture_source(&dir)
        .boxes_match_label("face")
        .skip_empty_images();
    let augment = RotationAugment::new(2, 10.0);
    let dataset = load_landmark_dataset(source, Some(augment)).unwrap();

    // one annotated source image plus 2n rotated copies
    assert_eq!(dataset.images.len(), 5);
    assert_eq!(dataset.detections.len(), 5);
    assert_eq!(dataset.ignored.len(), 5);

    let center = Point::new(r64(239.0 / 2.0), r64(239.0 / 2.0));
    let source_det = &dataset.detections[0][0];
    for det in dataset.detections[1..].iter().map(|dets| &dets[0]) {
        // the rectangle is carried over unrotated
        assert_eq!(det.rect, source_det.rect);
        // rotated parts keep their distance to the image center
        for (index, point) in det.present_parts() {
            let original = source_det.part(index).unwrap();
            assert_abs_diff_eq!(
                point.distance_to(&center).raw(),
                original.distance_to(&center).raw(),
                epsilon = 1e-9
            );
        }
    }

    // copies differ from the source and from each other
    let first_eyes: Vec<_> = dataset.detections[1..]
        .iter()
        .map(|dets| dets[0].part(0).unwrap())
        .collect();
    assert!(first_eyes.iter().all(|&p| p != source_det.part(0).unwrap()));
    assert_eq!(
        first_eyes.iter().unique().count(),
        first_eyes.len(),
        "each angle must produce a distinct rotation"
    );
}

#[test]
fn landmark_load_rejects_multiple_kept_boxes() {
    let dir = write_fixture();
    let metadata = r#"<dataset><images>
      <image file='img_b.png'>
        <box top='5' left='5' width='20' height='20'/>
        <box top='30' left='30' width='20' height='20'/>
      </image>
    </images></dataset>"#;
    fs::write(dir.path().join("two_boxes.xml"), metadata).unwrap();

    let err =
        load_landmark_dataset(DatasetSource::new(dir.path().join("two_boxes.xml")), None)
            .unwrap_err();
    assert!(matches!(err, Error::MultipleObjectBoxes { count: 2, .. }));
}

#[test]
fn parts_requirement_drops_boxes_entirely() {
    let dir = write_fixture();
    let dataset = load_rect_dataset(fixture_source(&dir).boxes_have_parts()).unwrap();

    // img_a's kept box has parts and survives; its ignored box has none
    // and is dropped rather than reported as ignored
    assert_eq!(dataset.boxes[0].len(), 1);
    assert!(dataset.ignored[0].is_empty());

    // img_b's partless box is dropped, not moved to the ignored list
    assert!(dataset.boxes[1].is_empty());
    assert!(dataset.ignored[1].is_empty());
}

#[test]
fn missing_image_aborts_the_load() {
    let dir = write_fixture();
    let metadata = r#"<dataset><images>
      <image file='no_such_image.png'>
        <box top='0' left='0' width='10' height='10'/>
      </image>
    </images></dataset>"#;
    fs::write(dir.path().join("missing.xml"), metadata).unwrap();

    let err = load_rect_dataset(DatasetSource::new(dir.path().join("missing.xml"))).unwrap_err();
    assert!(matches!(err, Error::ImageDecode { .. }));
}
