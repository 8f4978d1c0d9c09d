//! Webcam frame source backed by nokhwa.

use image::RgbImage;
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use tracing::info;

use crate::error::{FrameError, StartupError};
use crate::pipeline::FrameSource;

pub struct NokhwaCamera {
    camera: Camera,
    resolution: (u32, u32),
}

impl NokhwaCamera {
    /// Open and start streaming from camera `index`, asking for the format
    /// closest to `resolution` at 30 fps.
    pub fn open(index: u32, resolution: (u32, u32)) -> Result<Self, StartupError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(resolution.0, resolution.1),
            FrameFormat::MJPEG,
            30,
        )));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| StartupError::CameraUnavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| StartupError::CameraUnavailable(e.to_string()))?;

        let actual = camera.resolution();
        let resolution = (actual.width(), actual.height());
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(StartupError::CameraUnavailable(format!(
                "camera {} reported an empty frame size",
                index
            )));
        }

        info!(
            "Opened camera {} ({}) at {}x{}",
            index,
            camera.info().human_name(),
            resolution.0,
            resolution.1
        );

        Ok(Self { camera, resolution })
    }
}

impl FrameSource for NokhwaCamera {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| FrameError::Unavailable(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| FrameError::Decode(e.to_string()))?;

        // nokhwa links its own `image` version, so rebuild from raw bytes
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| FrameError::Decode(format!("truncated {}x{} frame", width, height)))
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}
