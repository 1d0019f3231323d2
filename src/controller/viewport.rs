use crate::model::Camera;

/// Drawing-buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

/// Logical window size and the pixel ratio the surface is rendered at.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
    max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: clamp_ratio(device_pixel_ratio, max_pixel_ratio),
            max_pixel_ratio,
        }
    }

    /// Apply a new window size. Returns the surface size to configure, or
    /// `None` when the window is collapsed and the old size is kept.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
        camera: &mut Camera,
    ) -> Option<PhysicalSize> {
        if width == 0 || height == 0 {
            tracing::debug!("ignoring resize to {}x{}", width, height);
            return None;
        }
        self.width = width;
        self.height = height;
        self.pixel_ratio = clamp_ratio(device_pixel_ratio, self.max_pixel_ratio);
        camera.set_aspect(width, height);
        Some(self.physical_size())
    }

    pub fn physical_size(&self) -> PhysicalSize {
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).round() as u32).max(1);
        PhysicalSize { width: scale(self.width), height: scale(self.height) }
    }
}

fn clamp_ratio(device_pixel_ratio: f64, max: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(max)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;

    fn camera() -> Camera {
        Camera::new(&DemoConfig::default().camera, 800, 600)
    }

    #[test]
    fn test_resize_sets_aspect_and_caps_ratio() {
        let mut cam = camera();
        let mut viewport = Viewport::new(800, 600, 1.0, 2.0);

        let size = viewport.resize(1024, 512, 3.0, &mut cam).unwrap();
        assert_eq!((viewport.width, viewport.height), (1024, 512));
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(cam.aspect, 2.0);
        assert_eq!(size, PhysicalSize { width: 2048, height: 1024 });

        let size = viewport.resize(300, 200, 1.5, &mut cam).unwrap();
        assert_eq!(viewport.pixel_ratio, 1.5);
        assert_eq!(size, PhysicalSize { width: 450, height: 300 });
        assert!((cam.aspect - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_size_keeps_previous() {
        let mut cam = camera();
        let mut viewport = Viewport::new(800, 600, 1.0, 2.0);
        assert!(viewport.resize(0, 600, 1.0, &mut cam).is_none());
        assert!(viewport.resize(800, 0, 1.0, &mut cam).is_none());
        assert_eq!((viewport.width, viewport.height), (800, 600));
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_ratio_falls_back_to_one() {
        let viewport = Viewport::new(10, 10, f64::NAN, 2.0);
        assert_eq!(viewport.pixel_ratio, 1.0);
        assert_eq!(viewport.physical_size(), PhysicalSize { width: 10, height: 10 });
    }
}
