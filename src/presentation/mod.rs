//! Presentation state and its application to the rendered view
//!
//! Presentation (theme, font scale, image scale, page geometry) is applied to an already
//! rendered view without re-running the Markdown transform.

pub mod controller;
pub mod page;
pub mod stylesheet;
pub mod theme;

pub use controller::PresentationController;
pub use page::{Margins, Orientation, PageSettings, PageSize};
pub use theme::{DiagramTheme, Palette, Theme};

use serde::{Deserialize, Serialize};

/// Font size multiplier, always within [`FontScale::MIN`, `FontScale::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct FontScale(f32);

impl FontScale {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;
    pub const STEP: f32 = 0.05;

    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() { factor } else { 1.0 };
        let clamped = factor.clamp(Self::MIN, Self::MAX);
        // Keep repeated steps from drifting (1.0 + 0.05 * n)
        Self((clamped * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn increase(&mut self) {
        *self = Self::new(self.0 + Self::STEP);
    }

    pub fn decrease(&mut self) {
        *self = Self::new(self.0 - Self::STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scaled size for a theme base size in pixels
    pub fn apply_to(&self, base_px: f32) -> f32 {
        base_px * self.0
    }
}

impl Default for FontScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f32> for FontScale {
    fn from(factor: f32) -> Self {
        Self::new(factor)
    }
}

impl From<FontScale> for f32 {
    fn from(scale: FontScale) -> Self {
        scale.0
    }
}

/// Multiplier on the maximum width of embedded images, exposed to the
/// stylesheet as `--image-scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct ImageScale(f32);

impl ImageScale {
    pub const MIN: f32 = 0.3;
    pub const MAX: f32 = 2.0;
    pub const STEP: f32 = 0.1;

    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() { factor } else { 1.0 };
        let clamped = factor.clamp(Self::MIN, Self::MAX);
        Self((clamped * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn increase(&mut self) {
        *self = Self::new(self.0 + Self::STEP);
    }

    pub fn decrease(&mut self) {
        *self = Self::new(self.0 - Self::STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for ImageScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f32> for ImageScale {
    fn from(factor: f32) -> Self {
        Self::new(factor)
    }
}

impl From<ImageScale> for f32 {
    fn from(scale: ImageScale) -> Self {
        scale.0
    }
}

/// User-selected presentation, independent of document content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationState {
    pub theme: Theme,
    pub font_scale: FontScale,
    pub image_scale: ImageScale,
    pub page: PageSettings,
}

impl PresentationState {
    pub fn palette(&self) -> &'static Palette {
        self.theme.palette()
    }

    /// Effective article font size in pixels
    pub fn font_size_px(&self) -> f32 {
        self.font_scale.apply_to(self.palette().font_size_px)
    }

    pub fn diagram_theme(&self) -> DiagramTheme {
        self.theme.diagram_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_scale_clamps() {
        assert_eq!(FontScale::new(3.0).value(), 2.0);
        assert_eq!(FontScale::new(0.1).value(), 0.5);
        assert_eq!(FontScale::new(f32::NAN).value(), 1.0);
    }

    #[test]
    fn test_font_scale_steps() {
        let mut scale = FontScale::default();
        scale.increase();
        scale.increase();
        assert_eq!(scale.value(), 1.1);
        for _ in 0..40 {
            scale.decrease();
        }
        assert_eq!(scale.value(), FontScale::MIN);
        scale.reset();
        assert_eq!(scale.value(), 1.0);
    }

    #[test]
    fn test_font_scale_deserialize_clamps() {
        let scale: FontScale = serde_json::from_str("7.5").unwrap();
        assert_eq!(scale.value(), 2.0);
    }

    #[test]
    fn test_image_scale_clamps_and_steps() {
        assert_eq!(ImageScale::new(5.0).value(), ImageScale::MAX);
        assert_eq!(ImageScale::new(0.0).value(), ImageScale::MIN);
        assert_eq!(ImageScale::new(f32::INFINITY).value(), 1.0);

        let mut scale = ImageScale::default();
        for _ in 0..3 {
            scale.decrease();
        }
        assert_eq!(scale.value(), 0.7);
        for _ in 0..30 {
            scale.decrease();
        }
        assert_eq!(scale.value(), 0.3);
        for _ in 0..30 {
            scale.increase();
        }
        assert_eq!(scale.value(), 2.0);
        scale.reset();
        assert_eq!(scale, ImageScale::default());

        let stored: ImageScale = serde_json::from_str("0.05").unwrap();
        assert_eq!(stored.value(), ImageScale::MIN);
    }

    #[test]
    fn test_font_size_uses_theme_base() {
        let state = PresentationState {
            theme: Theme::Literary,
            font_scale: FontScale::new(1.5),
            ..Default::default()
        };
        assert_eq!(state.font_size_px(), 27.0);
    }
}
