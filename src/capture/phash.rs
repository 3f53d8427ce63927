use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Hamming distance above which a new frame counts as a content change.
pub const PHASH_CHANGE_THRESHOLD: u32 = 10;

/// 64-bit mean hash in base64 form. Coarse on purpose: minor rendering noise
/// should map to the same fingerprint while a slide change should not.
pub fn compute_phash(img: &DynamicImage) -> String {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Mean)
        .hash_size(8, 8)
        .to_hasher();

    hasher.hash_image(img).to_base64()
}

pub fn hamming_distance(lhs: &str, rhs: &str) -> u32 {
    let Ok(h1) = ImageHash::<Vec<u8>>::from_base64(lhs) else {
        return u32::MAX;
    };
    let Ok(h2) = ImageHash::<Vec<u8>>::from_base64(rhs) else {
        return u32::MAX;
    };
    h1.dist(&h2)
}

/// Dedup policy: accept a frame only when it differs enough from the last
/// accepted one.
pub fn exceeds_change_threshold(previous: &str, current: &str) -> bool {
    hamming_distance(previous, current) > PHASH_CHANGE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(luma: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            64,
            64,
            Rgba([luma, luma, luma, 255]),
        ))
    }

    fn half_and_half() -> DynamicImage {
        let img = RgbaImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn identical_frames_are_not_a_change() {
        let a = compute_phash(&solid(250));
        let b = compute_phash(&solid(250));
        assert_eq!(hamming_distance(&a, &b), 0);
        assert!(!exceeds_change_threshold(&a, &b));
    }

    #[test]
    fn distinct_content_exceeds_the_threshold() {
        let a = compute_phash(&solid(250));
        let b = compute_phash(&half_and_half());
        assert!(hamming_distance(&a, &b) > PHASH_CHANGE_THRESHOLD);
        assert!(exceeds_change_threshold(&a, &b));
    }

    #[test]
    fn unparseable_hashes_never_match() {
        assert_eq!(hamming_distance("???", "???"), u32::MAX);
    }
}
