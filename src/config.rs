//! Runtime configuration for tonegen.
//!
//! All the values the original design hard-coded (bind address, CORS origin,
//! clip duration, model location) live here with documented defaults, are
//! overridable from the environment, and are passed into components at
//! construction time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default address the HTTP server binds to.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Default origin allowed by the CORS layer (the dev frontend).
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Default clip duration in seconds for served requests.
///
/// 10 seconds of MusicGen output is 500 decoder tokens at 50 tokens/second.
pub const DEFAULT_DURATION_SEC: u32 = 10;

/// Longest clip the server will generate, in seconds.
pub const MAX_DURATION_SEC: u32 = 30;

/// Runtime configuration for the server and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server listens on.
    pub bind_addr: String,

    /// Origin allowed by the CORS layer.
    pub allowed_origin: String,

    /// Path to the directory containing MusicGen ONNX model files.
    /// If None, uses the platform-specific default cache location.
    pub model_path: Option<PathBuf>,

    /// Clip duration in seconds for served generation requests.
    pub duration_sec: u32,

    /// Number of threads for intra-op parallelism in ONNX Runtime.
    /// If None, uses ONNX Runtime's default (typically number of CPU cores).
    pub threads: Option<u32>,
}

impl AppConfig {
    /// Creates a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an AppConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `TONEGEN_BIND` - Socket address to listen on
    /// - `TONEGEN_ALLOWED_ORIGIN` - CORS origin
    /// - `TONEGEN_MODEL_PATH` - Path to the MusicGen model directory
    /// - `TONEGEN_DURATION_SEC` - Clip duration for served requests
    /// - `TONEGEN_THREADS` - Number of threads for CPU execution
    ///
    /// Falls back to defaults for unset or unparseable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TONEGEN_BIND") {
            config.bind_addr = addr;
        }

        if let Ok(origin) = std::env::var("TONEGEN_ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }

        if let Ok(path) = std::env::var("TONEGEN_MODEL_PATH") {
            config.model_path = Some(PathBuf::from(path));
        }

        if let Ok(duration_str) = std::env::var("TONEGEN_DURATION_SEC") {
            if let Ok(duration) = duration_str.parse::<u32>() {
                if duration > 0 && duration <= MAX_DURATION_SEC {
                    config.duration_sec = duration;
                }
            }
        }

        if let Ok(threads_str) = std::env::var("TONEGEN_THREADS") {
            if let Ok(threads) = threads_str.parse::<u32>() {
                if threads > 0 {
                    config.threads = Some(threads);
                }
            }
        }

        config
    }

    /// Returns the effective model path, using platform defaults if not specified.
    pub fn effective_model_path(&self) -> PathBuf {
        if let Some(ref path) = self.model_path {
            path.clone()
        } else {
            default_model_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Some(format!("invalid bind address: {}", self.bind_addr));
        }

        if self.allowed_origin.is_empty() {
            return Some("allowed_origin must not be empty".to_string());
        }

        if self.duration_sec == 0 || self.duration_sec > MAX_DURATION_SEC {
            return Some(format!(
                "duration_sec must be between 1 and {}, got {}",
                MAX_DURATION_SEC, self.duration_sec
            ));
        }

        if let Some(threads) = self.threads {
            if threads == 0 {
                return Some("threads must be > 0".to_string());
            }
            if threads > 256 {
                return Some(format!("threads too high: {} (max 256)", threads));
            }
        }

        None
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            model_path: None,
            duration_sec: DEFAULT_DURATION_SEC,
            threads: None,
        }
    }
}

/// Returns the platform-specific default model storage path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/tonegen/musicgen
/// - Linux: ~/.cache/tonegen/musicgen
/// - Windows: C:\Users\<user>\AppData\Local\tonegen\cache\musicgen
fn default_model_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "tonegen") {
        proj_dirs.cache_dir().join("musicgen")
    } else {
        // Fallback to current directory
        PathBuf::from("./models")
    }
}
