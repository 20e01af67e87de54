//! 下载相关 trait：钩子接口，供分片下载器在各阶段调用。

use std::path::Path;

use async_trait::async_trait;

use crate::internal::downloader::structs::{DownloadProgress, FetchedChunk};
use crate::internal::remote_resource::structs::ResourceMetadata;

/// 钩子请求中止下载时使用的错误。
#[derive(Debug, Clone)]
pub struct HookAbort;

impl std::fmt::Display for HookAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("下载被钩子中止")
    }
}

impl std::error::Error for HookAbort {}

/// 下载流程钩子：在「开始前 / 分片完成 / 进度 / 完成后」插入自定义逻辑。
///
/// 使用方式二选一（可混用）：
/// - **单阶段**：用 `with_before_start_hook` / `with_on_chunk_hook` / `with_on_progress_hook` / `with_after_complete_hook` 传入闭包；
/// - **完整钩子**：实现本 trait，通过下载器的 `with_hook` 注册。
#[async_trait]
pub trait DownloadHook: Send + Sync {
    /// 探测完成、开始拉取分片前调用。返回 `Err` 则中止本次下载，此时尚未写入任何文件。
    async fn before_start(
        &mut self,
        _metadata: &ResourceMetadata,
    ) -> Result<(), HookAbort> {
        Ok(())
    }

    /// 某个分片完整写入临时文件后调用，调用顺序即完成顺序，不保证按序号。
    fn on_chunk_fetched(&mut self, _chunk: &FetchedChunk) {}

    /// 进度更新。
    fn on_progress(&mut self, _progress: &DownloadProgress) {}

    /// 合并成功后调用，参数为最终文件路径。
    async fn after_complete(&mut self, _path: &Path) {}
}
