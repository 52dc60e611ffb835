//! # Banner Module
//!
//! Rasterizes the two text banners: a rounded translucent panel with the
//! text centered inside it.
//!
//! Fonts are resolved through an ordered fallback chain (override file,
//! system font names, built-in bitmap font) that always yields a face.
//!
//! ```rust,no_run
//! use reel_compositor::banner::{BannerKind, BannerRenderer, BannerStyle, FontResolver};
//! use reel_compositor::config::BannerConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = BannerConfig::default();
//! let font = FontResolver::new(config.font.clone(), config.font_candidates.clone()).resolve();
//! let renderer = BannerRenderer::new(&font.face);
//!
//! let title = renderer.render(&config.title, &BannerStyle::from_config(&config, BannerKind::Title))?;
//! title.save("title.png")?;
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod font;
pub mod render;

pub use font::{FontFace, FontOrigin, FontResolver, ResolvedFont};
pub use render::{BannerRenderer, BannerStyle};

use crate::config::BannerConfig;

/// Which of the two banners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Shown during the first half
    Title,
    /// Call to action, shown during the second half
    Cta,
}

impl BannerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Cta => "cta",
        }
    }
}

impl BannerStyle {
    /// Panel style for one banner kind
    pub fn from_config(config: &BannerConfig, kind: BannerKind) -> Self {
        let (font_size, height) = match kind {
            BannerKind::Title => (config.title_size, config.title_box_height),
            BannerKind::Cta => (config.cta_size, config.cta_box_height),
        };

        Self {
            width: config.box_width,
            height,
            font_size,
            font_color: config.font_color,
            background: config.background_color(),
            corner_radius: config.corner_radius,
        }
    }
}

impl BannerConfig {
    /// Text and vertical position for one banner kind
    pub fn text_and_y(&self, kind: BannerKind) -> (&str, i32) {
        match kind {
            BannerKind::Title => (&self.title, self.top_y),
            BannerKind::Cta => (&self.cta, self.bottom_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_config() {
        let config = BannerConfig::default();

        let title = BannerStyle::from_config(&config, BannerKind::Title);
        assert_eq!((title.width, title.height, title.font_size), (1000, 150, 65.0));
        assert_eq!(title.background, [0, 0, 0, 160]);

        let cta = BannerStyle::from_config(&config, BannerKind::Cta);
        assert_eq!((cta.width, cta.height, cta.font_size), (1000, 160, 90.0));
    }

    #[test]
    fn test_text_and_y() {
        let config = BannerConfig::default();
        assert_eq!(config.text_and_y(BannerKind::Title), ("Premium Drink Menu Available on Sundays!", 200));
        assert_eq!(config.text_and_y(BannerKind::Cta), ("Book Now", 1600));
    }
}
