//! 清理：删除本次下载创建过的全部分片临时文件。

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::internal::downloader::error::CleanupError;

/// 逐个删除临时文件，每个路径只尝试一次。
///
/// `None` 槽位直接跳过；文件已不存在不算错误。其它删除失败记录为 [`CleanupError`] 返回，
/// 不会中断后续删除。
pub async fn cleanup_artifacts(artifacts: &[Option<PathBuf>]) -> Vec<CleanupError> {
    let mut errors = Vec::new();
    let mut removed = 0usize;

    let count = artifacts.iter().flatten().count();
    if count > 0 {
        info!(count, "removing artifacts");
    }

    for path in artifacts.iter().flatten() {
        match fs::remove_file(path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "artifact already gone");
            }
            Err(source) => {
                warn!(path = %path.display(), error = %source, "failed to remove artifact");
                errors.push(CleanupError {
                    path: path.clone(),
                    source,
                });
            }
        }
    }

    debug!(removed, failed = errors.len(), "artifacts cleaned up");
    errors
}
