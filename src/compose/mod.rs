pub mod blend;
mod compositor;
mod fill;
pub mod tone;

pub use compositor::{composite, composite_with_alpha, feather_size, upscale_mask, Compositor};
pub use fill::{gradient_at, render_fill};
pub use tone::apply_tone;
