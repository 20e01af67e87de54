//! 分片下载：执行单段 Range 下载，创建临时文件、发起请求、流式写盘并更新进度。

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::internal::config::constants::CHUNK_FILE_PREFIX;
use crate::internal::downloader::chunk_handler::ProgressTracker;
use crate::internal::downloader::error::FetchError;
use crate::internal::downloader::structs::{
    ArtifactSlot, ChunkFailure, ChunkWindow, FetchedChunk,
};

/// 执行单段 Range 下载时的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct DownloadOneRangeParams {
    pub client: Client,
    pub url: Url,
    pub window: ChunkWindow,
    /// 窗口覆盖整个资源时允许服务器返回 200
    pub whole_resource: bool,
    pub temp_dir: PathBuf,
    pub cancel: CancellationToken,
    pub tracker: ProgressTracker,
    /// 创建的临时文件登记在这里
    pub artifact: ArtifactSlot,
}

/// 下载一个分片到新建的临时文件，只尝试一次。
///
/// 临时文件创建后立即登记到 `params.artifact`；失败时不删除，交给清理阶段。
/// 写入字节数与窗口长度不一致视为失败。
pub(crate) async fn download_one_range(
    params: DownloadOneRangeParams,
) -> Result<FetchedChunk, ChunkFailure> {
    let index = params.window.index;
    if params.cancel.is_cancelled() {
        return Err(ChunkFailure::new(index, FetchError::Cancelled));
    }

    let Some(range) = params.window.range_header() else {
        // 空窗口：不发请求，只占位一个空文件
        let (_file, path) = create_artifact(&params.temp_dir, &params.artifact)
            .await
            .map_err(|e| ChunkFailure::new(index, e))?;
        debug!(index, path = %path.display(), "empty chunk, no request sent");
        return Ok(FetchedChunk { index, path });
    };

    let resp = tokio::select! {
        biased;
        _ = params.cancel.cancelled() => {
            return Err(ChunkFailure::new(index, FetchError::Cancelled));
        }
        resp = fetch_range_response(&params.client, &params.url, &range) => resp,
    };
    let resp = resp.map_err(|source| {
        ChunkFailure::new(index, FetchError::Request { index, source })
    })?;

    check_status(index, resp.status(), params.whole_resource)
        .map_err(|e| ChunkFailure::new(index, e))?;

    let (file, path) = create_artifact(&params.temp_dir, &params.artifact)
        .await
        .map_err(|e| ChunkFailure::new(index, e))?;

    let written = stream_to_file(resp, file, &params)
        .await
        .map_err(|e| ChunkFailure::new(index, e))?;
    check_length(index, params.window.len, written)
        .map_err(|e| ChunkFailure::new(index, e))?;

    debug!(index, %range, written, "chunk fetched");
    Ok(FetchedChunk { index, path })
}

async fn fetch_range_response(
    client: &Client,
    url: &Url,
    range: &str,
) -> Result<Response, reqwest::Error> {
    client.get(url.as_str()).header(RANGE, range).send().await
}

/// 206 总是可以接受；200 只在窗口覆盖整个资源时可以接受。
fn check_status(
    index: usize,
    status: StatusCode,
    whole_resource: bool,
) -> Result<(), FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status { index, status });
    }
    if status != StatusCode::PARTIAL_CONTENT && !whole_resource {
        return Err(FetchError::RangeIgnored { index });
    }
    Ok(())
}

fn check_length(index: usize, expected: u64, actual: u64) -> Result<(), FetchError> {
    if expected != actual {
        return Err(FetchError::LengthMismatch {
            index,
            expected,
            actual,
        });
    }
    Ok(())
}

/// 在临时目录中新建 `chunk*` 文件并保留在磁盘上，登记路径后返回异步文件句柄与路径。
async fn create_artifact(
    temp_dir: &Path,
    slot: &ArtifactSlot,
) -> Result<(File, PathBuf), FetchError> {
    let temp_dir = temp_dir.to_path_buf();
    let (file, path) = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
        tempfile::Builder::new()
            .prefix(CHUNK_FILE_PREFIX)
            .tempfile_in(&temp_dir)?
            .keep()
            .map_err(|e| e.error)
    })
    .await?
    .map_err(FetchError::CreateArtifact)?;
    slot.record(&path);

    Ok((File::from_std(file), path))
}

/// 逐帧写入临时文件，每帧之间检查取消；返回写入的总字节数。
async fn stream_to_file(
    resp: Response,
    file: File,
    params: &DownloadOneRangeParams,
) -> Result<u64, FetchError> {
    let index = params.window.index;
    let mut stream = resp.bytes_stream();
    let mut writer = BufWriter::new(file);
    let mut written = 0u64;

    loop {
        let frame = tokio::select! {
            biased;
            _ = params.cancel.cancelled() => return Err(FetchError::Cancelled),
            frame = stream.next() => frame,
        };
        let Some(frame) = frame else {
            break;
        };
        let bytes = frame.map_err(|source| FetchError::Request { index, source })?;

        writer
            .write_all(&bytes)
            .await
            .map_err(FetchError::WriteArtifact)?;
        written += bytes.len() as u64;
        params.tracker.add_bytes(bytes.len() as u64).await;
    }

    writer.flush().await.map_err(FetchError::WriteArtifact)?;
    Ok(written)
}
