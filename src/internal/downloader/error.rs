//! 下载相关错误类型。

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::internal::config::download_config::ConfigError;
use crate::internal::downloader::traits::download::HookAbort;
use crate::internal::remote_resource::error::ProbeError;

/// 单个分片的拉取错误。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("分片 {index} 请求失败: {source}")]
    Request {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("分片 {index} 返回状态码 {status}")]
    Status { index: usize, status: StatusCode },

    /// 服务器对部分区间请求返回了 200 整体内容。
    #[error("分片 {index} 的 Range 请求被服务器忽略")]
    RangeIgnored { index: usize },

    /// 响应体长度与窗口长度不一致。
    #[error("分片 {index} 应为 {expected} 字节，实际收到 {actual} 字节")]
    LengthMismatch {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("创建分片临时文件失败: {0}")]
    CreateArtifact(std::io::Error),

    #[error("写入分片临时文件失败: {0}")]
    WriteArtifact(std::io::Error),

    #[error("分片任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// 任务全部结束后仍有分片没有交付。
    #[error("分片 {index} 未交付")]
    MissingChunk { index: usize },

    #[error("下载被取消")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// 合并错误。
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("创建目标文件 {} 失败: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("打开分片 {index} 的临时文件 {} 失败: {source}", path.display())]
    OpenArtifact {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("复制分片 {index} 失败: {source}")]
    Copy {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("写入目标文件失败: {0}")]
    Write(std::io::Error),

    #[error("重命名为 {} 失败: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 删除临时文件失败（文件不存在不算错误）。
#[derive(Debug, Error)]
#[error("删除临时文件 {} 失败: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// 一次下载的主错误。
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("元数据探测失败: {0}")]
    Probe(#[from] ProbeError),

    #[error("分片下载失败: {0}")]
    Fetch(FetchError),

    #[error("合并失败: {0}")]
    Assemble(#[from] AssembleError),

    #[error("下载被取消")]
    Cancelled,

    /// 钩子在 before_start 中返回错误，中止下载。
    #[error("{0}")]
    HookAbort(#[from] HookAbort),

    #[error("创建 HTTP 客户端失败: {0}")]
    Client(reqwest::Error),
}

impl From<FetchError> for DownloadError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Cancelled => Self::Cancelled,
            other => Self::Fetch(other),
        }
    }
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
