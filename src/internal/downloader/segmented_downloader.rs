//! 分片下载器
//!
//! 把一个远程资源按字节区间切成 N 片并发下载，再按序合并成一个文件。
//!
//! ## 流程
//!
//! 1. 校验配置
//! 2. HEAD 探测资源大小、Range 支持、ETag、建议文件名
//! 3. 执行 `before_start` 钩子（可中止）
//! 4. 确定最终文件名并规划分片；服务器不支持 Range 时只用 1 个分片
//! 5. 每个分片一个任务并发拉取到临时文件，任一失败立即取消其余分片
//! 6. 全部成功时按序号合并
//! 7. 无论成败都删除所有临时文件
//! 8. 成功时执行 `after_complete` 钩子
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use multi_source_downloader::SegmentedDownloader;
//! # use multi_source_downloader::config::DownloadConfig;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::new("https://example.com/big.iso")?
//!     .chunk_count(4)
//!     .output_dir("downloads");
//!
//! let report = SegmentedDownloader::new(config)
//!     .with_on_progress_hook(|p| println!("{:.1}%", p.pct()))
//!     .send()
//!     .await;
//!
//! let path = report.into_result()?;
//! println!("saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::internal::config::download_config::DownloadConfig;
use crate::internal::downloader::assembler::assemble_chunks;
use crate::internal::downloader::chunk_handler::ProgressTracker;
use crate::internal::downloader::cleanup::cleanup_artifacts;
use crate::internal::downloader::error::DownloadError;
use crate::internal::downloader::orchestrator::{run_fetch_group, FetchGroupParams};
use crate::internal::downloader::structs::hook_adapters::{
    AfterCompleteHookAdapter, BeforeStartHookAdapter, OnChunkHookAdapter,
    OnProgressHookAdapter,
};
use crate::internal::downloader::structs::{
    ChunkPlan, DownloadHooksContainer, DownloadProgress, DownloadReport,
    FetchedChunk, PipelineOutcome,
};
use crate::internal::downloader::traits::download::{DownloadHook, HookAbort};
use crate::internal::remote_resource::file_name::resolve_file_name;
use crate::internal::remote_resource::prober::probe_resource;
use crate::internal::remote_resource::structs::ResourceMetadata;
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

/// 分片下载器
///
/// 拥有响应式属性（通过 `progress()` 获取）：已下载字节数与已完成分片数，探测完成后写入总大小与分片数。
pub struct SegmentedDownloader {
    config: DownloadConfig,
    client: Option<Client>,
    cancel: CancellationToken,
    hooks: DownloadHooksContainer,
    progress_state: UnlockReactiveProperty<DownloadProgress>,
}

/// 一次运行中需要留给收尾阶段的信息。
#[derive(Default)]
struct RunTrace {
    metadata: Option<ResourceMetadata>,
    artifacts: Vec<Option<PathBuf>>,
}

impl SegmentedDownloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self {
            config,
            client: None,
            cancel: CancellationToken::new(),
            hooks: Default::default(),
            progress_state: UnlockReactiveProperty::new(DownloadProgress::default()),
        }
    }

    /// 使用已有的 HTTP 客户端；不调用则在 `send` 时新建一个。
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// 使用外部取消令牌；取消后正在进行的分片会在下一个网络边界停止。
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 当前使用的取消令牌（克隆句柄）。
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 注册「开始前」钩子；参数为探测到的元数据，返回 `Err(HookAbort)` 会中止本次下载。
    pub fn with_before_start_hook<F, Fut>(mut self, f: F) -> Self
    where
        F: FnMut(ResourceMetadata) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HookAbort>> + Send + 'static,
    {
        self.hooks.add(BeforeStartHookAdapter(f));
        self
    }

    /// 注册「分片完成」钩子。
    pub fn with_on_chunk_hook<F>(mut self, f: F) -> Self
    where
        F: FnMut(&FetchedChunk) + Send + Sync + 'static,
    {
        self.hooks.add(OnChunkHookAdapter(f));
        self
    }

    /// 注册「进度」钩子。
    pub fn with_on_progress_hook<F>(mut self, f: F) -> Self
    where
        F: FnMut(&DownloadProgress) + Send + Sync + 'static,
    {
        self.hooks.add(OnProgressHookAdapter(f));
        self
    }

    /// 注册「完成后」钩子；合并成功且临时文件清理完毕后调用，参数为最终文件路径。
    pub fn with_after_complete_hook<F, Fut>(mut self, f: F) -> Self
    where
        F: FnMut(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.hooks.add(AfterCompleteHookAdapter(f));
        self
    }

    /// 添加完整钩子，在下载各阶段插入逻辑。
    pub fn with_hook(mut self, hook: impl DownloadHook + 'static) -> Self {
        self.hooks.add(hook);
        self
    }

    /// 内置的下载进度状态；返回可共享句柄，`.watch()` 后 `changed().await` 监听进度。
    pub fn progress(&self) -> UnlockReactiveProperty<DownloadProgress> {
        self.progress_state.clone()
    }

    /// 执行下载，总是返回一份报告；成败见 [`DownloadReport::outcome`]。
    pub async fn send(self) -> DownloadReport {
        let started = Instant::now();
        let Self {
            config,
            client,
            cancel,
            hooks,
            progress_state,
        } = self;
        let hooks = Arc::new(Mutex::new(hooks));
        let mut trace = RunTrace::default();

        let result = run_pipeline(
            RunPipelineParams {
                config: &config,
                client,
                cancel: &cancel,
                hooks: &hooks,
                progress: &progress_state,
            },
            &mut trace,
        )
        .await;

        let cleanup_errors = cleanup_artifacts(&trace.artifacts).await;

        let outcome = match result {
            Ok(path) => {
                hooks.lock().await.run_after_complete(&path).await;
                info!(path = %path.display(), "download finished");
                PipelineOutcome::Assembled(path)
            }
            Err(DownloadError::Cancelled) => {
                info!("download cancelled");
                PipelineOutcome::Failed(DownloadError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "download failed");
                PipelineOutcome::Failed(e)
            }
        };

        DownloadReport {
            outcome,
            metadata: trace.metadata,
            elapsed: started.elapsed(),
            cleanup_errors,
        }
    }
}

/// 执行下载主流程时的参数（形参超过 3 个，用 struct 承载）。
struct RunPipelineParams<'a> {
    config: &'a DownloadConfig,
    client: Option<Client>,
    cancel: &'a CancellationToken,
    hooks: &'a Arc<Mutex<DownloadHooksContainer>>,
    progress: &'a UnlockReactiveProperty<DownloadProgress>,
}

/// 探测 → 规划 → 拉取 → 合并；创建过的临时文件记录在 `trace` 中，由调用方统一清理。
async fn run_pipeline(
    params: RunPipelineParams<'_>,
    trace: &mut RunTrace,
) -> Result<PathBuf, DownloadError> {
    let config = params.config;
    config.validate()?;

    let client = match params.client {
        Some(client) => client,
        None => Client::builder().build().map_err(DownloadError::Client)?,
    };
    if params.cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }

    let url = &config.url;
    let metadata = tokio::select! {
        biased;
        _ = params.cancel.cancelled() => return Err(DownloadError::Cancelled),
        probed = probe_resource(&client, url) => probed?,
    };
    trace.metadata = Some(metadata.clone());

    params.hooks.lock().await.run_before_start(&metadata).await?;

    let name = resolve_file_name(&metadata, config.output_name.as_deref());
    let destination = config.output_dir.join(name);

    if !metadata.supports_ranges && config.chunk_count > 1 {
        warn!(
            requested = config.chunk_count,
            "server does not accept byte ranges, falling back to a single chunk"
        );
    }
    let plan = ChunkPlan::for_resource(&metadata, config.chunk_count);
    info!(
        %url,
        file = %destination.display(),
        size = metadata.total_size,
        chunks = plan.len(),
        "download started"
    );

    let tracker = ProgressTracker::new(
        metadata.total_size,
        plan.len(),
        params.progress.clone(),
        Arc::clone(params.hooks),
    );
    let group = run_fetch_group(FetchGroupParams {
        client,
        url: url.clone(),
        plan,
        temp_dir: config.temp_dir_or_default(),
        cancel: params.cancel.clone(),
        tracker,
    })
    .await;
    trace.artifacts = group.artifacts;
    let chunks = group.result?;

    if params.cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }

    let written = assemble_chunks(&destination, &chunks).await?;
    info!(file = %destination.display(), written, "chunks merged");

    Ok(destination)
}
