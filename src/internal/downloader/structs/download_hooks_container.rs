use std::path::Path;

use crate::internal::downloader::traits::download::{DownloadHook, HookAbort};
use crate::internal::remote_resource::structs::ResourceMetadata;

use super::{DownloadProgress, FetchedChunk};

/// 钩子容器：按注册顺序依次执行。
#[derive(Default)]
pub struct DownloadHooksContainer {
    hooks: Vec<Box<dyn DownloadHook>>,
}

impl DownloadHooksContainer {
    /// 添加一个下载钩子；支持多次调用以注册多个钩子，按添加顺序依次执行。
    pub fn add(&mut self, hook: impl DownloadHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// 任一钩子返回 `Err` 即停止，后续钩子不再执行。
    pub async fn run_before_start(
        &mut self,
        metadata: &ResourceMetadata,
    ) -> Result<(), HookAbort> {
        for h in self.hooks.iter_mut() {
            h.before_start(metadata).await?;
        }
        Ok(())
    }

    pub fn run_on_chunk_fetched(&mut self, chunk: &FetchedChunk) {
        for h in self.hooks.iter_mut() {
            h.on_chunk_fetched(chunk);
        }
    }

    pub fn run_on_progress(&mut self, progress: &DownloadProgress) {
        for h in self.hooks.iter_mut() {
            h.on_progress(progress);
        }
    }

    pub async fn run_after_complete(&mut self, path: &Path) {
        for h in self.hooks.iter_mut() {
            h.after_complete(path).await;
        }
    }
}
