use crate::error::ConfigError;
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// An sRGB color, written as `#rrggbb` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::InvalidColor(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(s.to_string()))
        };
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Swatches offered next to the solid color picker
pub const PRESET_COLORS: &[(&str, Color)] = &[
    ("violet", Color::new(0x9b, 0x4d, 0xff)),
    ("copper", Color::new(0xb8, 0x73, 0x33)),
    ("platinum", Color::new(0xe5, 0xe4, 0xe2)),
    ("rose", Color::new(0xe8, 0x6a, 0x92)),
    ("teal", Color::new(0x1f, 0x9e, 0x9a)),
    ("jet", Color::new(0x1b, 0x1b, 0x1f)),
];

/// Look up a preset swatch by name (case-insensitive)
pub fn preset(name: &str) -> Option<Color> {
    PRESET_COLORS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, color)| *color)
}

/// What gets painted into the hair region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ColorSpec {
    Solid {
        color: Color,
    },
    /// Two-stop vertical gradient; `shift` moves both stops by a fraction of the height
    Gradient {
        top: Color,
        bottom: Color,
        shift: f32,
    },
}

impl Default for ColorSpec {
    fn default() -> Self {
        ColorSpec::Solid {
            color: Color::new(0x9b, 0x4d, 0xff),
        }
    }
}

/// Global tone adjustment, each component in [-100, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneAdjust {
    pub hue: i32,
    pub saturation: i32,
    pub lightness: i32,
}

impl ToneAdjust {
    pub fn is_identity(&self) -> bool {
        self.hue == 0 && self.saturation == 0 && self.lightness == 0
    }
}

/// Everything the compositor needs for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TintConfig {
    pub color: ColorSpec,
    /// Opacity of the color layer, 0 = invisible, 1 = fully opaque
    pub strength: f32,
    /// Edge softening applied while upscaling the mask
    pub feather: f32,
    pub tone: ToneAdjust,
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            color: ColorSpec::default(),
            strength: 0.65,
            feather: 0.4,
            tone: ToneAdjust::default(),
        }
    }
}

/// Mask stabilizer tuning and segmentation cadence
///
/// The threshold and gain defaults are empirical; different cameras and
/// platforms favour different values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Confidence below this (after gain) is treated as background
    pub thresh: f32,
    /// Multiplier applied to raw confidence before thresholding
    pub gain: f32,
    /// Weight of the newest mask in the temporal blend
    pub ema_alpha: f32,
    /// Run the 3x3 blur and second threshold pass
    pub blur_enabled: bool,
    /// Segmentation ticks per second
    pub seg_fps: u32,
    /// Compute resolution as a fraction of the display resolution
    pub seg_scale: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            thresh: 0.5,
            gain: 1.1,
            ema_alpha: 0.6,
            blur_enabled: true,
            seg_fps: 15,
            seg_scale: 0.5,
        }
    }
}

impl SegmentationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.seg_fps.max(1) as f64)
    }
}

/// Complete, immutable pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tint: TintConfig,
    pub segmentation: SegmentationConfig,
    /// Display ticks per second
    pub display_fps: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tint: TintConfig::default(),
            segmentation: SegmentationConfig::default(),
            display_fps: 30,
        }
    }
}

impl PipelineConfig {
    pub fn display_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.display_fps.max(1) as f64)
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tint = &self.tint;
        if let ColorSpec::Gradient { shift, .. } = tint.color {
            check_range("gradient_shift", shift, -0.5, 0.5)?;
        }
        check_range("strength", tint.strength, 0.0, 1.0)?;
        check_range("feather", tint.feather, 0.0, f32::MAX)?;
        check_range("hue", tint.tone.hue as f32, -100.0, 100.0)?;
        check_range("sat", tint.tone.saturation as f32, -100.0, 100.0)?;
        check_range("light", tint.tone.lightness as f32, -100.0, 100.0)?;

        let seg = &self.segmentation;
        check_range("thresh", seg.thresh, 0.0, 1.0)?;
        check_range("gain", seg.gain, 0.0, f32::MAX)?;
        check_range("ema_alpha", seg.ema_alpha, 0.0, 1.0)?;
        check_positive("seg_fps", seg.seg_fps as f32)?;
        check_positive("seg_scale", seg.seg_scale)?;
        check_range("seg_scale", seg.seg_scale, 0.0, 1.0)?;
        check_positive("display_fps", self.display_fps as f32)?;

        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    // NaN fails both comparisons, so test for containment rather than exclusion
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min: min as f64,
            max: max as f64,
            value: value as f64,
        })
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field,
            value: value as f64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TintMode {
    Solid,
    Gradient,
}

/// Command-line style configuration surface
///
/// Front ends embed this with `#[command(flatten)]` and convert it with
/// `PipelineConfig::try_from`.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Fill mode for the hair region
    #[arg(long, value_enum, default_value_t = TintMode::Solid)]
    pub mode: TintMode,

    /// Flat fill color (#rrggbb)
    #[arg(long, default_value = "#9b4dff")]
    pub solid_color: Color,

    /// Gradient color at the top of the frame
    #[arg(long, default_value = "#f5d08b")]
    pub gradient_top: Color,

    /// Gradient color at the bottom of the frame
    #[arg(long, default_value = "#8e44ad")]
    pub gradient_bottom: Color,

    /// Vertical gradient offset as a fraction of frame height
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub gradient_shift: f32,

    /// Opacity of the applied color
    #[arg(long, default_value_t = 0.65)]
    pub strength: f32,

    /// Mask edge softening
    #[arg(long, default_value_t = 0.4)]
    pub feather: f32,

    /// Hue rotation (-100..100)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub hue: i32,

    /// Saturation adjustment (-100..100)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub sat: i32,

    /// Lightness adjustment (-100..100)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub light: i32,

    /// Mask confidence threshold
    #[arg(long, default_value_t = 0.5)]
    pub thresh: f32,

    /// Mask confidence gain
    #[arg(long, default_value_t = 1.1)]
    pub gain: f32,

    /// Temporal smoothing weight of the newest mask
    #[arg(long, default_value_t = 0.6)]
    pub ema_alpha: f32,

    /// Skip the 3x3 mask blur
    #[arg(long)]
    pub no_blur: bool,

    /// Segmentation rate
    #[arg(long, default_value_t = 15)]
    pub seg_fps: u32,

    /// Compute resolution as a fraction of the frame size
    #[arg(long, default_value_t = 0.5)]
    pub seg_scale: f32,

    /// Display rate
    #[arg(long, default_value_t = 30)]
    pub display_fps: u32,
}

impl TryFrom<ConfigArgs> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(args: ConfigArgs) -> Result<Self, Self::Error> {
        let color = match args.mode {
            TintMode::Solid => ColorSpec::Solid {
                color: args.solid_color,
            },
            TintMode::Gradient => ColorSpec::Gradient {
                top: args.gradient_top,
                bottom: args.gradient_bottom,
                shift: args.gradient_shift,
            },
        };

        let config = PipelineConfig {
            tint: TintConfig {
                color,
                strength: args.strength,
                feather: args.feather,
                tone: ToneAdjust {
                    hue: args.hue,
                    saturation: args.sat,
                    lightness: args.light,
                },
            },
            segmentation: SegmentationConfig {
                thresh: args.thresh,
                gain: args.gain,
                ema_alpha: args.ema_alpha,
                blur_enabled: !args.no_blur,
                seg_fps: args.seg_fps,
                seg_scale: args.seg_scale,
            },
            display_fps: args.display_fps,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> Result<PipelineConfig, ConfigError> {
        let cli = Cli::try_parse_from(std::iter::once("hair-tint").chain(args.iter().copied()))
            .expect("arguments should parse");
        PipelineConfig::try_from(cli.config)
    }

    #[test]
    fn defaults_match_default_impl() {
        assert_eq!(parse(&[]).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn gradient_mode_with_negative_shift() {
        let config = parse(&[
            "--mode",
            "gradient",
            "--gradient-top",
            "ffffff",
            "--gradient-shift",
            "-0.25",
        ])
        .unwrap();

        assert_eq!(
            config.tint.color,
            ColorSpec::Gradient {
                top: Color::new(255, 255, 255),
                bottom: Color::new(0x8e, 0x44, 0xad),
                shift: -0.25,
            }
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parse(&["--strength", "1.5"]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "strength", .. }));

        let err = parse(&["--light", "-101"]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "light", .. }));

        let err = parse(&["--seg-scale", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "seg_scale", .. }));

        let err = parse(&["--seg-fps", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "seg_fps", .. }));
    }

    #[test]
    fn nan_is_out_of_range() {
        let mut config = PipelineConfig::default();
        config.segmentation.ema_alpha = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn color_parsing() {
        assert_eq!("#9B4DFF".parse::<Color>().unwrap(), Color::new(0x9b, 0x4d, 0xff));
        assert_eq!(Color::new(1, 2, 255).to_string(), "#0102ff");
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zz0000".parse::<Color>().is_err());
        assert!("#ééé".parse::<Color>().is_err());
    }

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(preset("Violet"), Some(Color::new(0x9b, 0x4d, 0xff)));
        assert_eq!(preset("chartreuse"), None);
    }

    #[test]
    fn config_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.tint.color = ColorSpec::Gradient {
            top: Color::new(10, 20, 30),
            bottom: Color::new(40, 50, 60),
            shift: 0.1,
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"mode\":\"gradient\""));
        assert!(json.contains("#0a141e"));
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"segmentation": {"thresh": 0.7}}"#).unwrap();
        assert_eq!(config.segmentation.thresh, 0.7);
        assert_eq!(config.segmentation.seg_fps, 15);
        assert_eq!(config.tint, TintConfig::default());
    }
}
