//! 单阶段钩子适配器：将闭包包装成 [`DownloadHook`]，供 `with_xx_hook` 使用。

use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::internal::downloader::traits::download::{DownloadHook, HookAbort};
use crate::internal::remote_resource::structs::ResourceMetadata;

use super::{DownloadProgress, FetchedChunk};

/// 仅实现「开始前」的钩子适配器，闭包拿到元数据的副本。
pub(crate) struct BeforeStartHookAdapter<F>(pub(crate) F);

#[async_trait]
impl<F, Fut> DownloadHook for BeforeStartHookAdapter<F>
where
    F: FnMut(ResourceMetadata) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookAbort>> + Send + 'static,
{
    async fn before_start(
        &mut self,
        metadata: &ResourceMetadata,
    ) -> Result<(), HookAbort> {
        (self.0)(metadata.clone()).await
    }
}

/// 仅实现「分片完成」的钩子适配器。
pub(crate) struct OnChunkHookAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadHook for OnChunkHookAdapter<F>
where
    F: FnMut(&FetchedChunk) + Send + Sync + 'static,
{
    fn on_chunk_fetched(&mut self, chunk: &FetchedChunk) {
        (self.0)(chunk);
    }
}

/// 仅实现「进度」的钩子适配器。
pub(crate) struct OnProgressHookAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadHook for OnProgressHookAdapter<F>
where
    F: FnMut(&DownloadProgress) + Send + Sync + 'static,
{
    fn on_progress(&mut self, progress: &DownloadProgress) {
        (self.0)(progress);
    }
}

/// 仅实现「完成后」的钩子适配器。
pub(crate) struct AfterCompleteHookAdapter<F>(pub(crate) F);

#[async_trait]
impl<F, Fut> DownloadHook for AfterCompleteHookAdapter<F>
where
    F: FnMut(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn after_complete(&mut self, path: &Path) {
        (self.0)(path.to_path_buf()).await
    }
}
