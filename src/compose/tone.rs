use super::blend::{over, to_byte, to_unit};
use crate::config::ToneAdjust;
use image::RgbImage;

/// Rec. 709 luma weights
pub const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Degrees of hue rotation per unit of the hue control (+-100 maps to +-180)
const HUE_DEGREES_PER_STEP: f32 = 1.8;

pub fn luma(px: [f32; 3]) -> f32 {
    LUMA[0] * px[0] + LUMA[1] * px[1] + LUMA[2] * px[2]
}

/// Push all channels toward white (positive) or black (negative)
pub fn adjust_lightness(px: [f32; 3], lightness: i32) -> [f32; 3] {
    let amount = (lightness.unsigned_abs() as f32 / 100.0).min(1.0);
    match lightness.signum() {
        1 => over(px, [1.0; 3], amount),
        -1 => over(px, [0.0; 3], amount),
        _ => px,
    }
}

/// Move each channel toward (negative) or away from (positive) the pixel's luma
pub fn adjust_saturation(px: [f32; 3], saturation: i32) -> [f32; 3] {
    let saturation = saturation.clamp(-100, 100);
    let factor = if saturation < 0 {
        (100 - saturation.abs()) as f32 / 100.0
    } else {
        1.0 + saturation as f32 / 100.0
    };

    let gray = luma(px);
    px.map(|c| gray + (c - gray) * factor)
}

/// Luminance-preserving hue rotation matrix for `degrees`
pub fn hue_matrix(degrees: f32) -> [[f32; 3]; 3] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn apply_matrix(m: &[[f32; 3]; 3], px: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * px[0] + m[0][1] * px[1] + m[0][2] * px[2],
        m[1][0] * px[0] + m[1][1] * px[1] + m[1][2] * px[2],
        m[2][0] * px[0] + m[2][1] * px[1] + m[2][2] * px[2],
    ]
}

/// Apply lightness, then saturation, then hue to every pixel in place
pub fn apply_tone(image: &mut RgbImage, tone: &ToneAdjust) {
    if tone.is_identity() {
        return;
    }
    let _span = tracing::debug_span!("tone").entered();

    let hue = (tone.hue != 0)
        .then(|| hue_matrix(tone.hue.clamp(-100, 100) as f32 * HUE_DEGREES_PER_STEP));

    for pixel in image.pixels_mut() {
        let mut px = to_unit(pixel.0);
        if tone.lightness != 0 {
            px = adjust_lightness(px, tone.lightness);
        }
        if tone.saturation != 0 {
            px = adjust_saturation(px, tone.saturation);
        }
        if let Some(matrix) = &hue {
            px = apply_matrix(matrix, px);
        }
        pixel.0 = to_byte(px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn toned(px: [u8; 3], tone: ToneAdjust) -> [u8; 3] {
        let mut image = RgbImage::from_pixel(1, 1, Rgb(px));
        apply_tone(&mut image, &tone);
        image.get_pixel(0, 0).0
    }

    #[test]
    fn identity_leaves_pixels_alone() {
        assert_eq!(toned([12, 200, 99], ToneAdjust::default()), [12, 200, 99]);
    }

    #[test]
    fn lightness_extremes() {
        let white = ToneAdjust {
            lightness: 100,
            ..ToneAdjust::default()
        };
        let black = ToneAdjust {
            lightness: -100,
            ..ToneAdjust::default()
        };
        assert_eq!(toned([40, 80, 120], white), [255, 255, 255]);
        assert_eq!(toned([40, 80, 120], black), [0, 0, 0]);

        let half = ToneAdjust {
            lightness: 50,
            ..ToneAdjust::default()
        };
        assert_eq!(toned([0, 0, 0], half), [128, 128, 128]);
    }

    #[test]
    fn full_desaturation_is_luma_gray() {
        let gray = ToneAdjust {
            saturation: -100,
            ..ToneAdjust::default()
        };
        let [r, g, b] = toned([255, 0, 0], gray);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54); // 0.2126 * 255
    }

    #[test]
    fn saturation_boost_spreads_channels() {
        let boost = ToneAdjust {
            saturation: 50,
            ..ToneAdjust::default()
        };
        let [r, g, b] = toned([150, 100, 100], boost);
        assert!(r > 150);
        assert!(g < 100 && b < 100);
    }

    #[test]
    fn hue_keeps_gray_and_shifts_color() {
        let shift = ToneAdjust {
            hue: 67,
            ..ToneAdjust::default()
        };
        let gray = toned([128, 128, 128], shift);
        assert!(gray.iter().all(|&c| c.abs_diff(128) <= 1));

        let [r, g, _] = toned([255, 0, 0], shift);
        assert!(g > r, "red should rotate toward green");
    }
}
