pub(crate) mod config;
pub(crate) mod downloader;
pub(crate) mod remote_resource;
pub(crate) mod states;
