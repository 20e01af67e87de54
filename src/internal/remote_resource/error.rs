//! 元数据探测错误。

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("元数据请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} 返回状态码 {status}")]
    Status { url: String, status: StatusCode },

    #[error("响应头缺少 Content-Length")]
    MissingSize,

    #[error("Content-Length 不是合法的非负整数: {0:?}")]
    InvalidSize(String),
}
