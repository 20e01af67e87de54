pub mod constants;
pub mod download_config;
