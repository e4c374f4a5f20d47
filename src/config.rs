use crate::preprocessing::Preset;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    /// Engine used by `/scan` when none is named; first available if unset
    pub default_engine: Option<String>,
    pub preset: Preset,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9393,
            max_file_size: 10 * 1024 * 1024,
            default_engine: None,
            preset: Preset::default(),
            tessdata_path: None,
        }
    }
}
