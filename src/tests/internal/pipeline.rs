//! 端到端测试：从探测到合并、清理的完整下载流程。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::SegmentedDownloader;
use crate::config::{ConfigError, DownloadConfig};
use crate::downloader::download::{DownloadHook, HookAbort};
use crate::downloader::{
    ChunkPlan, DownloadError, DownloadProgress, FetchError, FetchedChunk, PipelineOutcome,
};
use crate::remote_resource::ResourceMetadata;
use crate::tests::{
    count_files, file_url, mount_head, mount_range_failure, mount_ranges, reference_payload,
    cancel_when_files_appear, spawn_raw_server, spawn_stalling_server, test_client,
    RANGE_HEADERS,
};

/// 临时分片目录与输出目录分开，便于分别检查。
struct Dirs {
    temp: TempDir,
    out: TempDir,
}

impl Dirs {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            out: TempDir::new().unwrap(),
        }
    }

    fn config(&self, url: &str, chunks: usize) -> DownloadConfig {
        DownloadConfig::new(url)
            .unwrap()
            .chunk_count(chunks)
            .output_dir(self.out.path())
            .temp_dir(self.temp.path())
    }
}

/// 记录各阶段调用顺序的完整钩子。
#[derive(Clone, Default)]
struct RecordingHook {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl DownloadHook for RecordingHook {
    async fn before_start(
        &mut self,
        metadata: &ResourceMetadata,
    ) -> Result<(), HookAbort> {
        self.events
            .lock()
            .unwrap()
            .push(format!("before:{}", metadata.total_size));
        Ok(())
    }

    fn on_chunk_fetched(&mut self, _chunk: &FetchedChunk) {
        self.events.lock().unwrap().push("chunk".to_string());
    }

    async fn after_complete(&mut self, path: &Path) {
        self.events
            .lock()
            .unwrap()
            .push(format!("after:{}", path.file_name().unwrap().to_string_lossy()));
    }
}

#[tokio::test]
async fn round_trip_reproduces_reference_bytes() {
    let server = MockServer::start().await;
    let payload = reference_payload(100_003);
    let plan = ChunkPlan::new(payload.len() as u64, 6);
    let mut headers = RANGE_HEADERS.to_vec();
    headers.push(("Content-Disposition", "attachment; filename=\"data.bin\""));
    headers.push(("ETag", "\"v1\""));
    mount_head(&server, &payload, &headers).await;
    // 完成顺序与序号相反
    let delays: Vec<Duration> = (0..6).rev().map(|i| Duration::from_millis(i * 40)).collect();
    mount_ranges(&server, &payload, &plan, &delays).await;
    let dirs = Dirs::new();

    let recorder = RecordingHook::default();
    let chunk_calls = Arc::new(AtomicUsize::new(0));
    let last_bytes = Arc::new(AtomicU64::new(0));
    let calls = Arc::clone(&chunk_calls);
    let bytes = Arc::clone(&last_bytes);

    let downloader = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 6))
        .with_client(test_client())
        .with_hook(recorder.clone())
        .with_on_chunk_hook(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .with_on_progress_hook(move |p: &DownloadProgress| {
            bytes.store(p.bytes_done, Ordering::SeqCst);
        });
    let progress = downloader.progress();

    let report = downloader.send().await;

    assert!(report.is_success(), "{:?}", report.outcome);
    assert!(report.cleanup_errors.is_empty());
    let metadata = report.metadata.clone().unwrap();
    assert_eq!(metadata.etag.as_deref(), Some("\"v1\""));

    let path = report.into_result().unwrap();
    assert_eq!(path, dirs.out.path().join("data.bin"));
    assert_eq!(std::fs::read(&path).unwrap(), payload);
    assert_eq!(count_files(dirs.temp.path()), 0, "临时分片应全部删除");
    assert_eq!(count_files(dirs.out.path()), 1, "不应留下 .part 文件");

    let state = progress.get_current().unwrap();
    assert_eq!(state.bytes_done, payload.len() as u64);
    assert_eq!(state.total, payload.len() as u64);
    assert_eq!(state.chunks_done, 6);
    assert_eq!(state.chunk_count, 6);

    assert_eq!(chunk_calls.load(Ordering::SeqCst), 6);
    assert_eq!(last_bytes.load(Ordering::SeqCst), payload.len() as u64);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("before:100003"));
    assert_eq!(events.last().map(String::as_str), Some("after:data.bin"));
    assert_eq!(events.iter().filter(|e| *e == "chunk").count(), 6);
}

#[tokio::test]
async fn invalid_size_fails_before_any_fetch() {
    let url = spawn_raw_server(
        "HTTP/1.1 200 OK\r\nContent-Length: abc\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
    )
    .await;
    let dirs = Dirs::new();

    let report = SegmentedDownloader::new(dirs.config(url.as_str(), 4))
        .with_client(test_client())
        .send()
        .await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Probe(_))
    ));
    assert!(report.metadata.is_none());
    assert_eq!(count_files(dirs.temp.path()), 0);
    assert_eq!(count_files(dirs.out.path()), 0);
}

#[tokio::test]
async fn middle_chunk_failure_removes_everything() {
    let server = MockServer::start().await;
    let payload = reference_payload(300);
    let plan = ChunkPlan::new(300, 3);
    mount_head(&server, &payload, RANGE_HEADERS).await;
    mount_ranges(&server, &payload, &plan, &[]).await;
    // 其余两个分片先写完，中间分片才失败
    mount_range_failure(&server, "bytes=100-199", 500, Duration::from_millis(300)).await;
    let dirs = Dirs::new();

    let report = SegmentedDownloader::new(
        dirs.config(file_url(&server).as_str(), 3).output_name("out.bin"),
    )
    .with_client(test_client())
    .send()
    .await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Fetch(FetchError::Status { index: 1, .. }))
    ));
    assert!(report.cleanup_errors.is_empty());
    assert_eq!(count_files(dirs.temp.path()), 0);
    assert!(!dirs.out.path().join("out.bin").exists());
    assert_eq!(count_files(dirs.out.path()), 0);
}

#[tokio::test]
async fn missing_filename_header_gets_generated_name() {
    let server = MockServer::start().await;
    let payload = reference_payload(2048);
    let plan = ChunkPlan::new(2048, 4);
    mount_head(
        &server,
        &payload,
        &[("Accept-Ranges", "bytes"), ("Content-Type", "application/pdf")],
    )
    .await;
    mount_ranges(&server, &payload, &plan, &[]).await;
    let dirs = Dirs::new();

    let path = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 4))
        .with_client(test_client())
        .send()
        .await
        .into_result()
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let stem = name.strip_suffix(".pdf").expect("应根据 Content-Type 追加扩展名");
    assert!(!stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()), "{name}");
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

#[tokio::test]
async fn server_without_ranges_uses_single_request() {
    let server = MockServer::start().await;
    let payload = reference_payload(5000);
    mount_head(&server, &payload, &[]).await;
    Mock::given(method("GET"))
        .and(header("Range", "bytes=0-4999"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;
    let dirs = Dirs::new();

    let path = SegmentedDownloader::new(
        dirs.config(file_url(&server).as_str(), 8).output_name("whole.bin"),
    )
    .with_client(test_client())
    .send()
    .await
    .into_result()
    .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), payload);
    assert_eq!(count_files(dirs.temp.path()), 0);
}

#[tokio::test]
async fn before_start_hook_can_abort() {
    let server = MockServer::start().await;
    let payload = reference_payload(100);
    mount_head(&server, &payload, RANGE_HEADERS).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(206))
        .expect(0)
        .mount(&server)
        .await;
    let dirs = Dirs::new();

    let completed = Arc::new(AtomicUsize::new(0));
    let after = Arc::clone(&completed);
    let report = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 4))
        .with_client(test_client())
        .with_before_start_hook(|metadata: ResourceMetadata| async move {
            if metadata.total_size > 10 {
                Err(HookAbort)
            } else {
                Ok(())
            }
        })
        .with_after_complete_hook(move |_: PathBuf| {
            let after = Arc::clone(&after);
            async move {
                after.fetch_add(1, Ordering::SeqCst);
            }
        })
        .send()
        .await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::HookAbort(_))
    ));
    assert_eq!(report.metadata.map(|m| m.total_size), Some(100));
    assert_eq!(completed.load(Ordering::SeqCst), 0, "失败时不调用完成钩子");
    assert_eq!(count_files(dirs.temp.path()), 0);
}

#[tokio::test]
async fn external_cancellation_stops_and_cleans_up() {
    let server = MockServer::start().await;
    let payload = reference_payload(400);
    let plan = ChunkPlan::new(400, 4);
    mount_head(&server, &payload, RANGE_HEADERS).await;
    let slow = Duration::from_secs(10);
    // 两个分片很快完成，另外两个一直挂起
    mount_ranges(&server, &payload, &plan, &[Duration::ZERO, slow, Duration::ZERO, slow]).await;
    let dirs = Dirs::new();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 4))
        .with_client(test_client())
        .with_cancel_token(token)
        .send()
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Cancelled)
    ));
    assert_eq!(count_files(dirs.temp.path()), 0);
    assert_eq!(count_files(dirs.out.path()), 0);
}

#[tokio::test]
async fn cancellation_mid_body_removes_partial_artifacts() {
    let url = spawn_stalling_server(500, 100).await;
    let dirs = Dirs::new();

    let token = CancellationToken::new();
    cancel_when_files_appear(dirs.temp.path(), 2, token.clone());

    let started = Instant::now();
    let report = SegmentedDownloader::new(dirs.config(url.as_str(), 2).output_name("out.bin"))
        .with_client(test_client())
        .with_cancel_token(token)
        .send()
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Cancelled)
    ));
    assert!(report.cleanup_errors.is_empty());
    assert_eq!(count_files(dirs.temp.path()), 0);
    assert_eq!(count_files(dirs.out.path()), 0);
}

#[tokio::test]
async fn panicking_chunk_task_still_cleans_up() {
    let server = MockServer::start().await;
    let payload = reference_payload(300);
    let plan = ChunkPlan::new(300, 3);
    mount_head(&server, &payload, RANGE_HEADERS).await;
    mount_ranges(&server, &payload, &plan, &[]).await;
    let dirs = Dirs::new();

    // 进度钩子在分片任务内部被调用，此时临时文件已经创建
    let report = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 3))
        .with_client(test_client())
        .with_on_progress_hook(|p: &DownloadProgress| {
            if p.bytes_done > 0 {
                panic!("progress hook failure");
            }
        })
        .send()
        .await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Fetch(FetchError::TaskJoin(_)))
    ));
    assert!(report.cleanup_errors.is_empty());
    assert_eq!(count_files(dirs.temp.path()), 0);
    assert_eq!(count_files(dirs.out.path()), 0);
}

#[tokio::test]
async fn cancelled_token_prevents_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dirs = Dirs::new();

    let downloader = SegmentedDownloader::new(dirs.config(file_url(&server).as_str(), 2))
        .with_client(test_client());
    downloader.cancel_token().cancel();
    let report = downloader.send().await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Cancelled)
    ));
}

#[tokio::test]
async fn zero_chunks_rejected_by_validation() {
    let dirs = Dirs::new();
    let report = SegmentedDownloader::new(dirs.config("http://127.0.0.1:9/file.bin", 0))
        .with_client(test_client())
        .send()
        .await;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Failed(DownloadError::Config(ConfigError::ZeroChunks))
    ));
    assert!(report.metadata.is_none());
}
