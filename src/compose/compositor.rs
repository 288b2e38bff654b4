use super::blend::{over, soft_light_rgb, to_byte, to_unit};
use super::fill::render_fill;
use super::tone::apply_tone;
use crate::config::TintConfig;
use crate::segmentation::MaskImage;
use image::{imageops, GrayImage, Luma, RgbImage};
use std::sync::Arc;

/// Size the mask passes through on its way up to display resolution
///
/// A larger feather means a smaller intermediate and a softer edge once the
/// second bilinear pass stretches it back out.
pub fn feather_size(width: u32, height: u32, feather: f32) -> (u32, u32) {
    let feather = if feather.is_finite() { feather.max(0.0) } else { 0.0 };
    let divisor = 1.0 + 2.0 * feather;
    let shrink = |v: u32| ((v as f32 / divisor).floor() as u32).max(1);
    (shrink(width), shrink(height))
}

/// Upscale the mask alpha to display resolution, feathering on the way
pub fn upscale_mask(mask: &MaskImage, width: u32, height: u32, feather: f32) -> GrayImage {
    let _span = tracing::debug_span!("upscale_mask").entered();

    let source = mask.image();
    let mut alpha = GrayImage::from_fn(source.width(), source.height(), |x, y| {
        Luma([source.get_pixel(x, y)[3]])
    });

    for (w, h) in [feather_size(width, height, feather), (width, height)] {
        if alpha.dimensions() != (w, h) {
            alpha = imageops::resize(&alpha, w, h, imageops::FilterType::Triangle);
        }
    }

    alpha
}

/// Recolor `frame` inside the mask
///
/// Steps:
/// 1. Base layer is the camera frame
/// 2. Color layer from the `ColorSpec`
/// 3. Mask upscaled (and feathered) to frame size
/// 4. Color layer over the base at `strength * mask`
/// 5. Frame soft-lit back over the colored region so strands stay visible
/// 6. Global tone adjustment
///
/// Without a mask the frame comes back untouched.
pub fn composite(frame: &RgbImage, mask: Option<&MaskImage>, tint: &TintConfig) -> RgbImage {
    let Some(mask) = mask else {
        return frame.clone();
    };

    let (width, height) = frame.dimensions();
    let alpha = upscale_mask(mask, width, height, tint.feather);
    composite_with_alpha(frame, &alpha, tint)
}

/// Steps 2, 4, 5 and 6 of `composite`, with an alpha already at frame size
pub fn composite_with_alpha(frame: &RgbImage, alpha: &GrayImage, tint: &TintConfig) -> RgbImage {
    let _span = tracing::debug_span!("composite").entered();

    let (width, height) = frame.dimensions();
    debug_assert_eq!(alpha.dimensions(), (width, height));

    let color = render_fill(&tint.color, width, height);
    let strength = tint.strength.clamp(0.0, 1.0);

    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let coverage = alpha.get_pixel(x, y)[0];
        if coverage == 0 {
            continue;
        }
        let m = coverage as f32 / 255.0;

        let base = to_unit(pixel.0);
        let tinted = over(base, to_unit(color.get_pixel(x, y).0), strength * m);
        let textured = over(tinted, soft_light_rgb(tinted, base), m);
        pixel.0 = to_byte(textured);
    }

    apply_tone(&mut out, &tint.tone);
    out
}

struct CachedAlpha {
    source: Arc<MaskImage>,
    size: (u32, u32),
    feather: f32,
    alpha: GrayImage,
}

/// Compositor for the display loop
///
/// The mask changes at segmentation rate while frames arrive at display rate,
/// so the upscaled alpha is kept until the mask, frame size or feather changes.
#[derive(Default)]
pub struct Compositor {
    cache: Option<CachedAlpha>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composite(
        &mut self,
        frame: &RgbImage,
        mask: Option<&Arc<MaskImage>>,
        tint: &TintConfig,
    ) -> RgbImage {
        let Some(mask) = mask else {
            return frame.clone();
        };

        let size = frame.dimensions();
        let fresh = match &self.cache {
            Some(cached) => {
                !Arc::ptr_eq(&cached.source, mask)
                    || cached.size != size
                    || cached.feather != tint.feather
            }
            None => true,
        };

        if fresh {
            self.cache = Some(CachedAlpha {
                source: Arc::clone(mask),
                size,
                feather: tint.feather,
                alpha: upscale_mask(mask, size.0, size.1, tint.feather),
            });
        }

        match &self.cache {
            Some(cached) => composite_with_alpha(frame, &cached.alpha, tint),
            None => frame.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, ColorSpec};
    use image::Rgb;
    use ndarray::Array2;

    fn mask(value: f32, size: usize) -> MaskImage {
        MaskImage::from_alpha(&Array2::from_elem((size, size), value))
    }

    #[test]
    fn feather_size_never_collapses() {
        assert_eq!(feather_size(640, 480, 0.0), (640, 480));
        assert_eq!(feather_size(640, 480, 0.5), (320, 240));
        assert_eq!(feather_size(3, 3, 100.0), (1, 1));
        assert_eq!(feather_size(640, 480, f32::NAN), (640, 480));
    }

    #[test]
    fn upscale_reaches_frame_size() {
        let alpha = upscale_mask(&mask(1.0, 4), 32, 24, 0.4);
        assert_eq!(alpha.dimensions(), (32, 24));
        assert!(alpha.pixels().all(|p| p[0] >= 254));
    }

    #[test]
    fn empty_mask_leaves_frame_alone() {
        let frame = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let out = composite(&frame, Some(&mask(0.0, 4)), &TintConfig::default());
        assert_eq!(out, frame);
    }

    #[test]
    fn zero_strength_keeps_only_texture_pass() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
        let tint = TintConfig {
            strength: 0.0,
            feather: 0.0,
            ..TintConfig::default()
        };
        let out = composite(&frame, Some(&mask(1.0, 4)), &tint);
        // Soft-light of mid grey onto itself is close to a no-op
        assert!(out.pixels().all(|p| p.0.iter().all(|&c| c.abs_diff(128) <= 1)));
    }

    #[test]
    fn compositor_reuses_alpha_for_same_mask() {
        let frame = RgbImage::from_pixel(6, 6, Rgb([128, 128, 128]));
        let tint = TintConfig {
            color: ColorSpec::Solid {
                color: Color::new(0, 255, 0),
            },
            ..TintConfig::default()
        };
        let shared = Arc::new(mask(1.0, 3));

        let mut compositor = Compositor::new();
        let first = compositor.composite(&frame, Some(&shared), &tint);
        let second = compositor.composite(&frame, Some(&shared), &tint);
        assert_eq!(first, second);
        assert_eq!(first, composite(&frame, Some(shared.as_ref()), &tint));

        let replaced = Arc::new(mask(0.0, 3));
        assert_eq!(compositor.composite(&frame, Some(&replaced), &tint), frame);
    }
}
