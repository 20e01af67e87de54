use std::path::PathBuf;
use std::time::Duration;

use crate::internal::downloader::error::{CleanupError, DownloadError};
use crate::internal::remote_resource::structs::ResourceMetadata;

/// 一次下载的最终结果，成功与失败二选一。
#[derive(Debug)]
pub enum PipelineOutcome {
    /// 最终文件路径
    Assembled(PathBuf),
    Failed(DownloadError),
}

/// 下载报告：结果、探测到的元数据、耗时，以及清理阶段的次要错误。
///
/// 清理错误只做记录，不会改变 `outcome`。
#[derive(Debug)]
pub struct DownloadReport {
    pub outcome: PipelineOutcome,
    /// 探测失败或探测前就中止时为 `None`
    pub metadata: Option<ResourceMetadata>,
    pub elapsed: Duration,
    pub cleanup_errors: Vec<CleanupError>,
}

impl DownloadReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Assembled(_))
    }

    /// 成功时返回最终文件路径，失败时返回主错误。
    pub fn into_result(self) -> Result<PathBuf, DownloadError> {
        match self.outcome {
            PipelineOutcome::Assembled(path) => Ok(path),
            PipelineOutcome::Failed(e) => Err(e),
        }
    }
}
