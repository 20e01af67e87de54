use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::internal::downloader::error::FetchError;

/// 已完整写入临时文件的分片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedChunk {
    /// 对应 [`ChunkWindow::index`](super::ChunkWindow::index)
    pub index: usize,
    /// 临时文件路径，由清理阶段统一删除
    pub path: PathBuf,
}

/// 分片失败。已创建的临时文件由失败方登记在 [`ArtifactSlot`] 中，失败方不自行删除。
#[derive(Debug)]
pub struct ChunkFailure {
    pub index: usize,
    pub error: FetchError,
}

impl ChunkFailure {
    pub(crate) fn new(index: usize, error: FetchError) -> Self {
        Self { index, error }
    }
}

/// 单个窗口的临时文件登记处，`clone` 后指向同一个槽位。
///
/// 文件一创建就登记，分片任务中途失败甚至 panic 时编排方仍能找到它。
#[derive(Debug, Clone, Default)]
pub struct ArtifactSlot(Arc<Mutex<Option<PathBuf>>>);

impl ArtifactSlot {
    pub(crate) fn record(&self, path: &Path) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_path_buf());
    }

    /// 取出登记的路径，槽位随之清空。
    pub fn take(&self) -> Option<PathBuf> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
