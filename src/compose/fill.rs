use crate::config::{Color, ColorSpec};
use image::{Rgb, RgbImage};

/// Fraction of the height where the gradient leaves the top color
const GRADIENT_START: f32 = 0.2;
/// Fraction of the height where the gradient reaches the bottom color
const GRADIENT_END: f32 = 0.8;

/// Paint a full-frame color layer
pub fn render_fill(spec: &ColorSpec, width: u32, height: u32) -> RgbImage {
    match *spec {
        ColorSpec::Solid { color } => RgbImage::from_pixel(width, height, Rgb(color.0)),
        ColorSpec::Gradient { top, bottom, shift } => {
            let mut layer = RgbImage::new(width, height);
            for (y, row) in layer.enumerate_rows_mut() {
                let color = gradient_at(top, bottom, shift, y, height);
                for (_, _, pixel) in row {
                    *pixel = color;
                }
            }
            layer
        }
    }
}

/// Gradient color for row `y`, sampled at the pixel centre
///
/// Rows above the first stop take `top`, rows below the second take `bottom`.
pub fn gradient_at(top: Color, bottom: Color, shift: f32, y: u32, height: u32) -> Rgb<u8> {
    let shift = shift.clamp(-0.5, 0.5);
    let h = height as f32;
    let y0 = h * (GRADIENT_START + shift);
    let y1 = h * (GRADIENT_END + shift);

    let span = y1 - y0;
    let t = if span > 0.0 {
        ((y as f32 + 0.5 - y0) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgb([
        mix(top.0[0], bottom.0[0]),
        mix(top.0[1], bottom.0[1]),
        mix(top.0[2], bottom.0[2]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: Color = Color::new(255, 0, 0);
    const BOTTOM: Color = Color::new(0, 0, 255);

    #[test]
    fn solid_fills_every_pixel() {
        let layer = render_fill(&ColorSpec::Solid { color: TOP }, 3, 2);
        assert!(layer.pixels().all(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn gradient_pads_beyond_stops() {
        let spec = ColorSpec::Gradient {
            top: TOP,
            bottom: BOTTOM,
            shift: 0.0,
        };
        let layer = render_fill(&spec, 1, 100);

        assert_eq!(layer.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(layer.get_pixel(0, 19).0, [255, 0, 0]);
        assert_eq!(layer.get_pixel(0, 80).0, [0, 0, 255]);
        assert_eq!(layer.get_pixel(0, 99).0, [0, 0, 255]);

        let middle = layer.get_pixel(0, 50).0;
        assert!(middle[0].abs_diff(middle[2]) <= 5, "middle row {middle:?}");
    }

    #[test]
    fn shift_moves_the_stops() {
        let up = gradient_at(TOP, BOTTOM, -0.2, 50, 100);
        let down = gradient_at(TOP, BOTTOM, 0.2, 50, 100);
        // Shifting up brings the bottom color higher in the frame
        assert!(up.0[2] > down.0[2]);
        assert!(up.0[0] < down.0[0]);
    }
}
