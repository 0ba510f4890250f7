use image::{ImageFormat, Rgb, RgbImage};
use realign::lowlevel::{gaussian_kernel, nearest_two, ImagePlane, ScalarL2};
use realign::{
    decode_image, encode_base64, Descriptor, Feature, FeatureSet, Keypoint, RealignError,
    DESCRIPTOR_LEN,
};
use std::io::Cursor;

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn one_hot(dim: usize, value: f32) -> Descriptor {
    let mut values = [0.0f32; DESCRIPTOR_LEN];
    values[dim] = value;
    Descriptor::new(values)
}

#[test]
fn image_plane_requires_exact_length() {
    assert!(ImagePlane::new(vec![0.0; 5], 2, 3).is_err());
    let plane = ImagePlane::new(vec![0.25; 6], 2, 3).unwrap();
    assert_eq!((plane.width(), plane.height()), (2, 3));
}

#[test]
fn feature_set_rejects_mismatched_parts() {
    let keypoints = vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0)];
    let descriptors = vec![one_hot(0, 1.0)];
    let err = FeatureSet::from_parts(keypoints, descriptors).unwrap_err();
    assert_eq!(
        err,
        RealignError::InvalidInput("keypoint and descriptor counts differ")
    );
}

#[test]
fn feature_set_keeps_index_alignment() {
    let keypoints = vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0)];
    let descriptors = vec![one_hot(0, 1.0), one_hot(1, 1.0)];
    let set = FeatureSet::from_parts(keypoints.clone(), descriptors.clone()).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(1).unwrap().keypoint.pt(), (3.0, 4.0));
    assert_eq!(set.get(1).unwrap().descriptor, descriptors[1]);
    assert!(set.keypoints().eq(keypoints.iter()));
    assert!(set.descriptors().eq(descriptors.iter()));
}

#[test]
fn descriptor_from_slice_checks_length() {
    assert!(Descriptor::from_slice(&[0.0; 64]).is_err());
    let d = Descriptor::from_slice(&[0.5; DESCRIPTOR_LEN]).unwrap();
    assert_eq!(d.as_slice().len(), DESCRIPTOR_LEN);
}

#[test]
fn descriptor_distance_is_euclidean() {
    let a = one_hot(0, 3.0);
    let b = one_hot(1, 4.0);
    assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    assert_eq!(a.distance(&a), 0.0);
}

#[test]
fn nearest_two_orders_candidates() {
    let query = one_hot(0, 1.0);
    let candidates: Vec<Feature> = [0.0f32, 0.9, 0.5]
        .iter()
        .map(|&v| Feature {
            keypoint: Keypoint::new(0.0, 0.0),
            descriptor: one_hot(0, v),
        })
        .collect();
    let (best, second) = nearest_two::<ScalarL2>(&query, &candidates).unwrap();
    assert_eq!(best.index, 1);
    assert_eq!(second.index, 2);
    assert!((best.sq_distance - 0.01).abs() < 1e-6);
    assert!(nearest_two::<ScalarL2>(&query, &candidates[..1]).is_none());
}

#[test]
fn gaussian_kernel_is_normalised_and_odd() {
    let kernel = gaussian_kernel(15, 2.6).unwrap();
    assert_eq!(kernel.len(), 15);
    let sum: f32 = kernel.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    assert!((kernel[0] - kernel[14]).abs() < 1e-7);
    assert!(gaussian_kernel(14, 2.6).is_err());
}

#[test]
fn decode_accepts_png_and_jpeg() {
    let img = RgbImage::from_fn(33, 21, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, 90]));

    let png = decode_image(&encode_base64(&encode(&img, ImageFormat::Png))).unwrap();
    assert_eq!(png, img);

    let jpeg = decode_image(&encode_base64(&encode(&img, ImageFormat::Jpeg))).unwrap();
    assert_eq!(jpeg.dimensions(), (33, 21));
}

#[test]
fn decode_classifies_failures() {
    let err = decode_image("@@@@").unwrap_err();
    assert!(matches!(err, RealignError::Decode { .. }));

    let err = decode_image(&encode_base64(b"plain text payload")).unwrap_err();
    assert!(matches!(err, RealignError::UnsupportedFormat { .. }));

    let img = RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]));
    let png = encode(&img, ImageFormat::Png);
    let err = decode_image(&encode_base64(&png[..40])).unwrap_err();
    assert!(matches!(err, RealignError::Decode { .. }));
}
