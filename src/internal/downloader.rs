//! 分片下载器：规划分片、并发拉取、按序合并、统一清理。

pub mod assembler;
pub mod cleanup;
pub mod error;
pub mod orchestrator;
pub mod range_fetcher;
pub mod segmented_downloader;
pub mod structs;
pub mod traits;

pub(crate) mod chunk_handler;
