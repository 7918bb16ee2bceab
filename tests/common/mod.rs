#![allow(dead_code)]

pub mod mock_asset_host;
pub mod mock_inference;

use seedance_gateway::ServerConfig;
use std::path::Path;

pub const TEST_API_KEY: &str = "r8_test_0123456789abcdef";

/// Config pointed at `dir`, with a credential and a 1s download bound.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        api_key: Some(TEST_API_KEY.to_string()),
        upload_dir: dir.join("uploads"),
        static_dir: dir.join("static"),
        download_timeout: 1,
        inference_workers: 8,
        ..ServerConfig::default()
    }
}

pub fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.join("uploads"))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
