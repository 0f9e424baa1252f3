use anyhow::{Context, Result};
use std::path::Path;

use pulsewatch_engine::config::{self, WatcherConfig};

pub fn load_config(path: Option<&str>) -> Result<WatcherConfig> {
    match path {
        Some(path) => config::load_from_file(Path::new(path))
            .with_context(|| format!("loading config from {path}")),
        None => Ok(WatcherConfig::default()),
    }
}
