//! 元数据探测：发送 HEAD 请求，不传输响应体。

use reqwest::Client;
use reqwest::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap,
    HeaderName,
};
use tracing::debug;
use url::Url;

use super::error::ProbeError;
use super::file_name::filename_from_content_disposition;
use super::structs::ResourceMetadata;

/// 探测远程资源，返回其元数据。
///
/// 以下情况返回 [`ProbeError`]：
/// - 网络请求失败
/// - 状态码不是 2xx
/// - 缺少 `Content-Length`，或其值不是合法的非负整数（不会当作 0 处理）
pub async fn probe_resource(
    client: &Client,
    url: &Url,
) -> Result<ResourceMetadata, ProbeError> {
    let resp = client.head(url.as_str()).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProbeError::Status {
            url: url.to_string(),
            status,
        });
    }

    let headers = resp.headers();
    let total_size = parse_content_length(headers)?;

    let name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .unwrap_or_default();

    let metadata = ResourceMetadata {
        name,
        total_size,
        etag: header_string(headers, ETAG),
        supports_ranges: accepts_byte_ranges(headers),
        content_type: header_string(headers, CONTENT_TYPE),
    };

    debug!(
        %url,
        size = metadata.total_size,
        ranges = metadata.supports_ranges,
        etag = ?metadata.etag,
        "resource probed"
    );

    Ok(metadata)
}

/// 解析 `Content-Length`。
pub(crate) fn parse_content_length(headers: &HeaderMap) -> Result<u64, ProbeError> {
    let raw = headers.get(CONTENT_LENGTH).ok_or(ProbeError::MissingSize)?;
    let text = raw.to_str().map_err(|_| {
        ProbeError::InvalidSize(String::from_utf8_lossy(raw.as_bytes()).into_owned())
    })?;

    text.trim()
        .parse::<u64>()
        .map_err(|_| ProbeError::InvalidSize(text.to_string()))
}

/// `Accept-Ranges` 中任一取值为 `bytes` 即视为支持（`none` 或缺省均不支持）。
fn accepts_byte_ranges(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_RANGES)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"))
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
