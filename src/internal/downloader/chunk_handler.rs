//! 分片下载：汇总各分片的写入量，更新整体进度并触发钩子。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::internal::downloader::structs::{
    DownloadHooksContainer, DownloadProgress, FetchedChunk,
};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

/// 所有分片任务共享的进度汇总句柄，`clone` 后仍指向同一份计数。
#[derive(Clone)]
pub(crate) struct ProgressTracker {
    bytes_done: Arc<AtomicU64>,
    chunks_done: Arc<AtomicUsize>,
    total: u64,
    chunk_count: usize,
    progress: UnlockReactiveProperty<DownloadProgress>,
    hooks: Arc<Mutex<DownloadHooksContainer>>,
}

impl ProgressTracker {
    pub(crate) fn new(
        total: u64,
        chunk_count: usize,
        progress: UnlockReactiveProperty<DownloadProgress>,
        hooks: Arc<Mutex<DownloadHooksContainer>>,
    ) -> Self {
        let _ = progress.update(DownloadProgress::planned(total, chunk_count));
        Self {
            bytes_done: Arc::new(AtomicU64::new(0)),
            chunks_done: Arc::new(AtomicUsize::new(0)),
            total,
            chunk_count,
            progress,
            hooks,
        }
    }

    /// 某个分片又写入了 `len` 字节。
    pub(crate) async fn add_bytes(&self, len: u64) {
        if len == 0 {
            return;
        }
        self.bytes_done.fetch_add(len, Ordering::Relaxed);
        self.publish().await;
    }

    /// 某个分片已交付给编排方。
    pub(crate) async fn chunk_done(&self, chunk: &FetchedChunk) {
        self.chunks_done.fetch_add(1, Ordering::Relaxed);
        let snapshot = self.snapshot();
        let _ = self.progress.update(snapshot.clone());

        let mut h = self.hooks.lock().await;
        h.run_on_chunk_fetched(chunk);
        h.run_on_progress(&snapshot);
    }

    pub(crate) fn snapshot(&self) -> DownloadProgress {
        DownloadProgress {
            bytes_done: self.bytes_done.load(Ordering::Relaxed),
            total: self.total,
            chunks_done: self.chunks_done.load(Ordering::Relaxed),
            chunk_count: self.chunk_count,
        }
    }

    async fn publish(&self) {
        let snapshot = self.snapshot();
        let _ = self.progress.update(snapshot.clone());
        self.hooks.lock().await.run_on_progress(&snapshot);
    }
}
