use crate::error::{Result, VideoError};

/// Uniform rescale followed by a centered crop to a fixed output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    /// Width after the uniform rescale
    pub scaled_width: u32,
    /// Height after the uniform rescale
    pub scaled_height: u32,
    /// Left edge of the crop window in the scaled frame
    pub x: u32,
    /// Top edge of the crop window in the scaled frame
    pub y: u32,
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
}

impl CropGeometry {
    /// Plan the resize and crop for a `source_width x source_height` input.
    ///
    /// The source is scaled so its height matches `target_height` and the
    /// sides are trimmed evenly. Sources narrower than the target aspect are
    /// scaled to the target width instead and trimmed evenly top and bottom,
    /// so the output is always exactly `target_width x target_height`.
    pub fn plan(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> Result<Self> {
        if source_width == 0 || source_height == 0 || target_width == 0 || target_height == 0 {
            return Err(VideoError::InvalidParameters {
                details: format!(
                    "cannot crop {}x{} to {}x{}",
                    source_width, source_height, target_width, target_height
                ),
            }.into());
        }

        let (sw, sh) = (source_width as u64, source_height as u64);
        let (tw, th) = (target_width as u64, target_height as u64);

        // Compare aspect ratios in integers: sw/sh >= tw/th
        let (scaled_width, scaled_height) = if sw * th >= tw * sh {
            let scaled = (sw * th + sh / 2) / sh;
            (scaled.max(tw), th)
        } else {
            let scaled = (sh * tw + sw / 2) / sw;
            (tw, scaled.max(th))
        };

        Ok(Self {
            scaled_width: scaled_width as u32,
            scaled_height: scaled_height as u32,
            x: ((scaled_width - tw) / 2) as u32,
            y: ((scaled_height - th) / 2) as u32,
            width: target_width,
            height: target_height,
        })
    }

    /// ffmpeg filter chain applying this geometry and resampling to `fps`
    pub fn filter_chain(&self, fps: u32) -> String {
        format!(
            "scale={}:{}:flags=bicubic,setsar=1,crop={}:{}:{}:{},fps={}",
            self.scaled_width, self.scaled_height, self.width, self.height, self.x, self.y, fps
        )
    }

    /// Bytes in one RGB24 output frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_source_is_center_cropped() {
        let geometry = CropGeometry::plan(1920, 1080, 1080, 1920).unwrap();
        assert_eq!(geometry.scaled_height, 1920);
        assert_eq!(geometry.scaled_width, 3413);
        assert_eq!(geometry.x, 1166);
        assert_eq!(geometry.y, 0);
        assert_eq!((geometry.width, geometry.height), (1080, 1920));
    }

    #[test]
    fn test_exact_aspect_source_is_only_scaled() {
        let geometry = CropGeometry::plan(720, 1280, 1080, 1920).unwrap();
        assert_eq!((geometry.scaled_width, geometry.scaled_height), (1080, 1920));
        assert_eq!((geometry.x, geometry.y), (0, 0));
    }

    #[test]
    fn test_narrow_source_is_cropped_vertically() {
        let geometry = CropGeometry::plan(600, 1600, 1080, 1920).unwrap();
        assert_eq!(geometry.scaled_width, 1080);
        assert_eq!(geometry.scaled_height, 2880);
        assert_eq!(geometry.x, 0);
        assert_eq!(geometry.y, 480);
    }

    #[test]
    fn test_output_is_always_target_size() {
        for (w, h) in [(1, 1), (3840, 2160), (1080, 1920), (1081, 1920), (333, 2001), (4000, 3)] {
            let g = CropGeometry::plan(w, h, 1080, 1920).unwrap();
            assert_eq!((g.width, g.height), (1080, 1920));
            assert!(g.x + g.width <= g.scaled_width, "{w}x{h}: {g:?}");
            assert!(g.y + g.height <= g.scaled_height, "{w}x{h}: {g:?}");
        }
    }

    #[test]
    fn test_zero_sized_source_is_rejected() {
        assert!(CropGeometry::plan(0, 1080, 1080, 1920).is_err());
    }

    #[test]
    fn test_filter_chain() {
        let geometry = CropGeometry::plan(1920, 1080, 1080, 1920).unwrap();
        assert_eq!(
            geometry.filter_chain(30),
            "scale=3413:1920:flags=bicubic,setsar=1,crop=1080:1920:1166:0,fps=30"
        );
        assert_eq!(geometry.frame_len(), 1080 * 1920 * 3);
    }
}
