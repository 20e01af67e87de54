//! 单次下载的不可变配置。
//!
//! 由外层（命令行、调用方代码）构建后整体交给 [`crate::SegmentedDownloader`]，
//! 下载流程内部不读取任何进程级全局状态。

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use super::constants::DEFAULT_CHUNK_COUNT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("URL 不能为空")]
    EmptyUrl,

    #[error("URL 格式错误: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("仅支持 http/https 协议，当前为 {0}")]
    UnsupportedScheme(String),

    #[error("分片数必须大于 0")]
    ZeroChunks,
}

/// 本次下载的配置。
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// 远程资源地址
    pub url: Url,
    /// 期望的分片数（服务器不支持 Range 时实际只用 1 个）
    pub chunk_count: usize,
    /// 最终文件所在目录
    pub output_dir: PathBuf,
    /// 指定最终文件名；为 `None` 时使用服务器建议的文件名或自动生成
    pub output_name: Option<String>,
    /// 分片临时文件目录；为 `None` 时使用系统临时目录
    pub temp_dir: Option<PathBuf>,
}

impl DownloadConfig {
    /// 以默认参数创建配置：8 个分片，保存到当前目录。
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url(url)?,
            chunk_count: DEFAULT_CHUNK_COUNT,
            output_dir: PathBuf::from("."),
            output_name: None,
            temp_dir: None,
        })
    }

    pub fn chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 指定最终文件名；传空字符串表示不指定。
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.output_name = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    pub fn temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// 校验配置；字段是公开的，调用方可能绕过构造函数直接修改。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_count == 0 {
            return Err(ConfigError::ZeroChunks);
        }
        check_scheme(&self.url)
    }

    pub(crate) fn temp_dir_or_default(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyUrl);
    }
    let url = Url::parse(trimmed)?;
    check_scheme(&url)?;
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
