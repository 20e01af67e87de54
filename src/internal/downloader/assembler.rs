//! 合并：按分片序号把临时文件依次写入最终文件。

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::internal::config::constants::PARTIAL_FILE_SUFFIX;
use crate::internal::downloader::error::AssembleError;
use crate::internal::downloader::structs::FetchedChunk;

/// 按序号升序合并全部分片，返回写入的总字节数。
///
/// 先写入同目录下的 `<文件名>.part`，全部刷盘后再重命名为 `destination`；
/// 任何一步失败都会删除 `.part` 文件，`destination` 不会出现半成品。
/// 已存在的 `destination` 会被覆盖。临时分片文件不在这里删除。
pub async fn assemble_chunks(
    destination: &Path,
    chunks: &[FetchedChunk],
) -> Result<u64, AssembleError> {
    let partial = partial_path(destination);
    info!(chunks = chunks.len(), path = %destination.display(), "merging chunks");

    match write_partial(&partial, chunks).await {
        Ok(written) => {
            if let Err(source) = fs::rename(&partial, destination).await {
                discard_partial(&partial).await;
                return Err(AssembleError::Persist {
                    path: destination.to_path_buf(),
                    source,
                });
            }
            debug!(path = %destination.display(), written, "chunks assembled");
            Ok(written)
        }
        Err(e) => {
            discard_partial(&partial).await;
            Err(e)
        }
    }
}

async fn write_partial(
    partial: &Path,
    chunks: &[FetchedChunk],
) -> Result<u64, AssembleError> {
    let mut ordered: Vec<&FetchedChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);

    let file = File::create(partial)
        .await
        .map_err(|source| AssembleError::CreateDestination {
            path: partial.to_path_buf(),
            source,
        })?;
    let mut writer = BufWriter::new(file);
    let mut written = 0u64;

    for chunk in ordered {
        let mut artifact = File::open(&chunk.path)
            .await
            .map_err(|source| AssembleError::OpenArtifact {
                index: chunk.index,
                path: chunk.path.clone(),
                source,
            })?;
        written += tokio::io::copy(&mut artifact, &mut writer)
            .await
            .map_err(|source| AssembleError::Copy {
                index: chunk.index,
                source,
            })?;
    }

    writer.flush().await.map_err(AssembleError::Write)?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(AssembleError::Write)?;

    Ok(written)
}

/// `<destination>.part`
fn partial_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination.as_os_str().to_owned();
    name.push(PARTIAL_FILE_SUFFIX);
    PathBuf::from(name)
}

async fn discard_partial(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %partial.display(), error = %e, "failed to remove partial file");
        }
    }
}
