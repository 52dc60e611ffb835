use image::RgbaImage;

use crate::banner::BannerKind;
use crate::error::{CompositionError, Result};
use crate::video::Frame;

/// Half-open display window `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BannerWindow {
    pub start: f64,
    pub end: f64,
}

impl BannerWindow {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Title for the first half, CTA for the second half
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BannerSchedule {
    pub title: BannerWindow,
    pub cta: BannerWindow,
}

impl BannerSchedule {
    /// Split `[0, duration)` at the midpoint
    pub fn split(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CompositionError::InvalidParameters {
                details: format!("clip duration must be positive, got {}", duration),
            }.into());
        }

        let midpoint = duration / 2.0;
        Ok(Self {
            title: BannerWindow { start: 0.0, end: midpoint },
            cta: BannerWindow { start: midpoint, end: duration },
        })
    }

    pub fn window(&self, kind: BannerKind) -> BannerWindow {
        match kind {
            BannerKind::Title => self.title,
            BannerKind::Cta => self.cta,
        }
    }
}

/// A rendered banner with its screen position and display window
#[derive(Debug, Clone)]
pub struct PlacedBanner {
    pub kind: BannerKind,
    pub image: RgbaImage,
    pub x: i64,
    pub y: i64,
    pub window: BannerWindow,
}

impl PlacedBanner {
    /// Place `image` horizontally centered in a `frame_width` frame at row `y`
    pub fn centered(kind: BannerKind, image: RgbaImage, frame_width: u32, y: i32, window: BannerWindow) -> Self {
        let x = (frame_width as i64 - image.width() as i64).div_euclid(2);
        Self {
            kind,
            image,
            x,
            y: y as i64,
            window,
        }
    }
}

/// Banners laid over the cropped clip
#[derive(Debug, Clone, Default)]
pub struct BannerTimeline {
    banners: Vec<PlacedBanner>,
}

impl BannerTimeline {
    pub fn new(banners: Vec<PlacedBanner>) -> Self {
        Self { banners }
    }

    /// Banners visible at `time`
    pub fn active_at(&self, time: f64) -> impl Iterator<Item = &PlacedBanner> {
        self.banners.iter().filter(move |b| b.window.contains(time))
    }

    /// Draw every banner visible at `time` onto `frame`
    pub fn apply(&self, frame: &mut Frame, time: f64) {
        for banner in self.active_at(time) {
            frame.overlay_rgba(&banner.image, banner.x, banner.y);
        }
    }

    pub fn banners(&self) -> &[PlacedBanner] {
        &self.banners
    }
}

/// Presentation time of frame `index` at `fps`
pub fn frame_time(index: u64, fps: u32) -> f64 {
    index as f64 / fps as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_ten_second_clip_splits_at_five() {
        let schedule = BannerSchedule::split(10.0).unwrap();
        assert_eq!(schedule.title, BannerWindow { start: 0.0, end: 5.0 });
        assert_eq!(schedule.cta, BannerWindow { start: 5.0, end: 10.0 });
    }

    #[test]
    fn test_windows_are_contiguous_and_cover_clip() {
        for duration in [0.1, 1.0, 7.3, 10.0, 59.94] {
            let schedule = BannerSchedule::split(duration).unwrap();
            assert_eq!(schedule.title.start, 0.0);
            assert_eq!(schedule.title.end, schedule.cta.start);
            assert_eq!(schedule.cta.end, duration);
            assert_eq!(schedule.title.duration(), schedule.cta.duration());
        }
    }

    #[test]
    fn test_windows_never_overlap() {
        let schedule = BannerSchedule::split(10.0).unwrap();
        for i in 0..300 {
            let t = frame_time(i, 30);
            assert!(schedule.title.contains(t) ^ schedule.cta.contains(t), "t = {t}");
        }
        assert!(!schedule.cta.contains(10.0));
    }

    #[test]
    fn test_invalid_duration() {
        assert!(BannerSchedule::split(0.0).is_err());
        assert!(BannerSchedule::split(f64::INFINITY).is_err());
    }

    #[test]
    fn test_banner_is_horizontally_centered() {
        let window = BannerWindow { start: 0.0, end: 1.0 };
        let banner = PlacedBanner::centered(BannerKind::Title, RgbaImage::new(1000, 150), 1080, 200, window);
        assert_eq!((banner.x, banner.y), (40, 200));

        let wide = PlacedBanner::centered(BannerKind::Cta, RgbaImage::new(1201, 10), 1080, 0, window);
        assert_eq!(wide.x, -61);
    }

    #[test]
    fn test_apply_draws_only_active_banner() {
        let schedule = BannerSchedule::split(2.0).unwrap();
        let red = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        let timeline = BannerTimeline::new(vec![
            PlacedBanner::centered(BannerKind::Title, red, 4, 0, schedule.title),
            PlacedBanner::centered(BannerKind::Cta, blue, 4, 3, schedule.cta),
        ]);

        let mut early = Frame::new_filled(4, 4, [0, 0, 0]);
        timeline.apply(&mut early, 0.5);
        assert_eq!(early.get_pixel(1, 0), [255, 0, 0]);
        assert_eq!(early.get_pixel(1, 3), [0, 0, 0]);

        let mut late = Frame::new_filled(4, 4, [0, 0, 0]);
        timeline.apply(&mut late, 1.0);
        assert_eq!(late.get_pixel(1, 0), [0, 0, 0]);
        assert_eq!(late.get_pixel(2, 3), [0, 0, 255]);
    }
}
