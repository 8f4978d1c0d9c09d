use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const MODEL_PATH_ENV: &str = "AQROAD_MODEL_PATH";
pub const CAMERA_INDEX_ENV: &str = "AQROAD_CAMERA_INDEX";

/// Application settings. There are no command line flags; defaults can be
/// overridden through the environment with [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Sign model weights, loaded once at startup
    pub model_path: PathBuf,
    pub camera_index: u32,
    /// Resolution requested from the camera (width, height)
    pub camera_resolution: (u32, u32),
    /// Detections at or below this confidence are discarded
    pub confidence_threshold: f32,
    /// Presentation refresh period
    pub tick_interval: Duration,
    /// Width of the video canvas; height follows the camera aspect ratio
    pub display_width: u32,
    pub speech_queue_capacity: usize,
    pub speech_shutdown_timeout: Duration,
    pub capture_shutdown_timeout: Duration,
    pub window_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/best.rten"),
            camera_index: 0,
            camera_resolution: (640, 480),
            confidence_threshold: 0.5,
            tick_interval: Duration::from_millis(33),
            display_width: 640,
            speech_queue_capacity: 8,
            speech_shutdown_timeout: Duration::from_secs(1),
            capture_shutdown_timeout: Duration::from_secs(1),
            window_title: "AQROAD: AI Road Sign Detector".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `AQROAD_MODEL_PATH` / `AQROAD_CAMERA_INDEX` applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.model_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(CAMERA_INDEX_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(index) => self.camera_index = index,
                Err(e) => warn!("Ignoring {}={:?}: {}", CAMERA_INDEX_ENV, raw, e),
            }
        }

        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_camera_index(mut self, index: u32) -> Self {
        self.camera_index = index;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_speech_queue_capacity(mut self, capacity: usize) -> Self {
        self.speech_queue_capacity = capacity.max(1);
        self
    }

    /// Canvas height for a camera of the given size, keeping aspect ratio.
    pub fn display_height(&self, video_width: u32, video_height: u32) -> u32 {
        if video_width == 0 {
            return self.display_width;
        }
        (self.display_width as u64 * video_height as u64 / video_width as u64) as u32
    }
}
