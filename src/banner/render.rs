use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::Font;
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::banner::builtin;
use crate::banner::font::FontFace;
use crate::error::{BannerError, Result};

/// Size and colors of one banner panel
#[derive(Debug, Clone, PartialEq)]
pub struct BannerStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: f32,
    pub font_color: [u8; 4],
    pub background: [u8; 4],
    pub corner_radius: u32,
}

/// Axis-aligned ink box in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
struct InkBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl InkBox {
    fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Offset that moves this box to the center of a `width x height` panel
    fn centering_offset(&self, width: u32, height: u32) -> (f32, f32) {
        (
            ((width as f32 - self.width()) / 2.0).floor() - self.x_min,
            ((height as f32 - self.height()) / 2.0).floor() - self.y_min,
        )
    }
}

/// Renders a rounded translucent panel with centered text
pub struct BannerRenderer<'a> {
    face: &'a FontFace,
}

impl<'a> BannerRenderer<'a> {
    pub fn new(face: &'a FontFace) -> Self {
        Self { face }
    }

    /// Render `text` into a `style.width x style.height` RGBA image.
    ///
    /// The image size never depends on the text; text wider than the panel is clipped.
    pub fn render(&self, text: &str, style: &BannerStyle) -> Result<RgbaImage> {
        if style.width == 0 || style.height == 0 {
            return Err(BannerError::InvalidParameters {
                details: format!("banner size {}x{}", style.width, style.height),
            }.into());
        }
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(BannerError::InvalidParameters {
                details: format!("font size {}", style.font_size),
            }.into());
        }

        let mut image = RgbaImage::new(style.width, style.height);
        fill_rounded_rect(&mut image, style.corner_radius, style.background);

        match self.face {
            FontFace::Outline(font) => draw_outline_text(&mut image, font, text, style),
            FontFace::Builtin => draw_builtin_text(&mut image, text, style),
        }

        Ok(image)
    }
}

/// Fill the whole image with a rounded rectangle of `color`
fn fill_rounded_rect(image: &mut RgbaImage, radius: u32, color: [u8; 4]) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let r = (radius as f32).min(w / 2.0).min(h / 2.0);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let cx = px.clamp(r, w - r);
        let cy = py.clamp(r, h - r);
        let (dx, dy) = (px - cx, py - cy);
        if dx * dx + dy * dy <= r * r {
            *pixel = Rgba(color);
        }
    }
}

fn draw_outline_text(image: &mut RgbaImage, font: &Font, text: &str, style: &BannerStyle) {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: 0.0,
        y: 0.0,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, style.font_size, 0));

    let ink = layout
        .glyphs()
        .iter()
        .filter(|g| g.width > 0 && g.height > 0)
        .fold(None, |acc: Option<InkBox>, g| {
            let glyph_box = InkBox {
                x_min: g.x,
                y_min: g.y,
                x_max: g.x + g.width as f32,
                y_max: g.y + g.height as f32,
            };
            Some(match acc {
                None => glyph_box,
                Some(b) => InkBox {
                    x_min: b.x_min.min(glyph_box.x_min),
                    y_min: b.y_min.min(glyph_box.y_min),
                    x_max: b.x_max.max(glyph_box.x_max),
                    y_max: b.y_max.max(glyph_box.y_max),
                },
            })
        });

    let Some(ink) = ink else {
        debug!("Banner text {:?} has no visible glyphs", text);
        return;
    };

    let (dx, dy) = ink.centering_offset(image.width(), image.height());
    debug!("Text ink box {:.0}x{:.0}, offset ({:.0}, {:.0})", ink.width(), ink.height(), dx, dy);

    for glyph in layout.glyphs().iter().filter(|g| g.width > 0 && g.height > 0) {
        let (_, coverage) = font.rasterize_config(glyph.key);
        let left = (glyph.x + dx).round() as i64;
        let top = (glyph.y + dy).round() as i64;

        for row in 0..glyph.height {
            for col in 0..glyph.width {
                let value = coverage[row * glyph.width + col];
                if value > 0 {
                    blend_pixel(image, left + col as i64, top + row as i64, style.font_color, value);
                }
            }
        }
    }
}

fn draw_builtin_text(image: &mut RgbaImage, text: &str, style: &BannerStyle) {
    let scale = builtin::scale_for(style.font_size) as i64;
    let cell = builtin::CELL_WIDTH as i64 * scale;
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return;
    }

    let ink = InkBox {
        x_min: 0.0,
        y_min: 0.0,
        x_max: (chars.len() as i64 * cell - scale) as f32,
        y_max: (builtin::GLYPH_HEIGHT as i64 * scale) as f32,
    };
    let (dx, dy) = ink.centering_offset(image.width(), image.height());
    let (origin_x, origin_y) = (dx as i64, dy as i64);
    let (width, height) = (image.width() as i64, image.height() as i64);

    for (i, &c) in chars.iter().enumerate() {
        let cell_x = origin_x + i as i64 * cell;
        if cell_x >= width || cell_x + cell <= 0 {
            continue;
        }
        let glyph = builtin::glyph(c);

        for col in 0..builtin::GLYPH_COLUMNS {
            for row in 0..builtin::GLYPH_HEIGHT {
                if !builtin::is_set(&glyph, col, row) {
                    continue;
                }
                // Clip each scaled dot to the panel
                let x0 = cell_x + col as i64 * scale;
                let y0 = origin_y + row as i64 * scale;
                for y in y0.max(0)..(y0 + scale).min(height) {
                    for x in x0.max(0)..(x0 + scale).min(width) {
                        blend_pixel(image, x, y, style.font_color, 255);
                    }
                }
            }
        }
    }
}

/// Source-over blend of `color` at `coverage` onto the pixel at (`x`, `y`), if in bounds
fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: [u8; 4], coverage: u8) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }

    let dst = image.get_pixel_mut(x as u32, y as u32);
    let src_a = (color[3] as f32 / 255.0) * (coverage as f32 / 255.0);
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }

    for c in 0..3 {
        let blended = (color[c] as f32 * src_a + dst.0[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst.0[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::font::{FontOrigin, FontResolver};
    use crate::config::DEFAULT_FONT_CANDIDATES;

    fn style(width: u32, height: u32, font_size: f32) -> BannerStyle {
        BannerStyle {
            width,
            height,
            font_size,
            font_color: [255, 255, 255, 255],
            background: [0, 0, 0, 160],
            corner_radius: 20,
        }
    }

    #[test]
    fn test_builtin_banner_has_requested_size() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        let image = renderer.render("Book Now", &style(1000, 160, 90.0)).unwrap();
        assert_eq!(image.dimensions(), (1000, 160));
    }

    #[test]
    fn test_overlong_text_keeps_panel_size() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        let text = "Premium Drink Menu Available on Sundays! ".repeat(20);
        let image = renderer.render(&text, &style(1000, 150, 65.0)).unwrap();
        assert_eq!(image.dimensions(), (1000, 150));
    }

    #[test]
    fn test_panel_has_rounded_transparent_corners() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        let image = renderer.render("", &style(1000, 150, 65.0)).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(999, 149).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(500, 0).0, [0, 0, 0, 160]);
        assert_eq!(image.get_pixel(0, 75).0, [0, 0, 0, 160]);
        assert_eq!(image.get_pixel(500, 75).0, [0, 0, 0, 160]);
    }

    #[test]
    fn test_builtin_text_is_centered() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        let image = renderer.render("I", &style(1000, 150, 65.0)).unwrap();

        // 'I' at scale 7: cell 35px wide starting at x=482, stem in column 2, rows 50..99
        assert_eq!(image.get_pixel(499, 75).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(499, 50).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(499, 49).0, [0, 0, 0, 160]);
        assert_eq!(image.get_pixel(470, 75).0, [0, 0, 0, 160]);
    }

    #[test]
    fn test_huge_builtin_font_is_clipped_to_panel() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        let image = renderer.render("Book Now", &style(1000, 160, 1.0e9)).unwrap();
        assert_eq!(image.dimensions(), (1000, 160));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let renderer = BannerRenderer::new(&FontFace::Builtin);
        assert!(renderer.render("x", &style(0, 150, 65.0)).is_err());
        assert!(renderer.render("x", &style(1000, 150, 0.0)).is_err());
    }

    #[test]
    fn test_resolved_system_font_renders_requested_size() {
        let candidates = DEFAULT_FONT_CANDIDATES.iter().map(|s| s.to_string()).collect();
        let resolved = FontResolver::new(None, candidates).resolve();

        let renderer = BannerRenderer::new(&resolved.face);
        let image = renderer.render("Premium Drink Menu Available on Sundays!", &style(1000, 150, 65.0)).unwrap();
        assert_eq!(image.dimensions(), (1000, 150));
    }

    /// Bounding box of pixels with any alpha as (left, right, top, bottom) margins
    fn ink_margins(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            });
        }
        bounds.map(|(x0, x1, y0, y1)| (x0, image.width() - 1 - x1, y0, image.height() - 1 - y1))
    }

    #[test]
    fn test_outline_text_is_centered_in_panel() {
        let mut candidates: Vec<String> = DEFAULT_FONT_CANDIDATES.iter().map(|s| s.to_string()).collect();
        candidates.extend(["DejaVuSans.ttf", "LiberationSans-Regular.ttf", "FreeSans.ttf"].map(String::from));

        let FontOrigin::System(path) = FontResolver::new(None, candidates).resolve().origin else {
            eprintln!("no outline font installed, skipping centering check");
            return;
        };

        let resolved = FontResolver::new(Some(path.clone()), Vec::new()).resolve();
        assert_eq!(resolved.origin, FontOrigin::Override(path));

        let mut style = style(1000, 160, 90.0);
        style.background = [0, 0, 0, 0];
        let image = BannerRenderer::new(&resolved.face).render("Book Now", &style).unwrap();

        let (left, right, top, bottom) = ink_margins(&image).expect("text should leave ink");
        assert!(left.abs_diff(right) <= 2, "left {left} right {right}");
        assert!(top.abs_diff(bottom) <= 2, "top {top} bottom {bottom}");
        assert!(left > 100 && top > 10, "text should sit well inside the panel");
    }

    #[test]
    fn test_blend_onto_translucent_panel() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 160]));
        blend_pixel(&mut image, 0, 0, [255, 255, 255, 255], 255);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);

        let mut image = RgbaImage::new(1, 1);
        blend_pixel(&mut image, 0, 0, [255, 0, 0, 255], 128);
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 128]);

        blend_pixel(&mut image, 5, 5, [255, 0, 0, 255], 255);
    }
}
