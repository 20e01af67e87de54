//! 分片下载：为每个窗口 spawn 一个任务，并发收集结果；任一分片失败立即取消其余分片。

use std::path::PathBuf;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::internal::downloader::chunk_handler::ProgressTracker;
use crate::internal::downloader::error::FetchError;
use crate::internal::downloader::range_fetcher::{download_one_range, DownloadOneRangeParams};
use crate::internal::downloader::structs::{
    ArtifactSlot, ChunkFailure, ChunkPlan, FetchedChunk,
};

/// 启动一组分片任务时的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct FetchGroupParams {
    pub client: Client,
    pub url: Url,
    pub plan: ChunkPlan,
    pub temp_dir: PathBuf,
    /// 调用方的取消令牌；本组使用它的子令牌
    pub cancel: CancellationToken,
    pub tracker: ProgressTracker,
}

/// 一组分片任务的结果。
pub(crate) struct FetchGroupOutcome {
    /// 按窗口序号排列的临时文件，无论成败都要交给清理阶段；`None` 表示该窗口没有创建文件
    pub artifacts: Vec<Option<PathBuf>>,
    /// 成功时按序号排列的全部分片
    pub result: Result<Vec<FetchedChunk>, FetchError>,
}

type ChunkTaskResult = Result<(), ChunkFailure>;

/// 并发拉取计划中的全部分片，等所有任务结束后才返回。
///
/// 主错误是第一个非取消类失败；若所有失败都是取消，主错误为 [`FetchError::Cancelled`]。
pub(crate) async fn run_fetch_group(params: FetchGroupParams) -> FetchGroupOutcome {
    let n = params.plan.len();
    let group = params.cancel.child_token();
    let (tx, rx) = mpsc::channel::<FetchedChunk>(n.max(1));

    debug!(chunks = n, total = params.plan.total_size(), "fetch group started");

    // 每个窗口一个登记槽位，任务 panic 也不会丢失已创建的临时文件
    let slots: Vec<ArtifactSlot> = (0..n).map(|_| ArtifactSlot::default()).collect();

    let mut tasks: JoinSet<ChunkTaskResult> = JoinSet::new();
    for (window, slot) in params.plan.windows().iter().copied().zip(&slots) {
        let fetch = DownloadOneRangeParams {
            client: params.client.clone(),
            url: params.url.clone(),
            window,
            whole_resource: params.plan.covers_whole(&window),
            temp_dir: params.temp_dir.clone(),
            cancel: group.clone(),
            tracker: params.tracker.clone(),
            artifact: slot.clone(),
        };
        let tx = tx.clone();
        let token = group.clone();
        tasks.spawn(async move {
            let chunk = download_one_range(fetch).await?;
            publish(chunk, &tx, &token).await
        });
    }
    // 只留任务手里的发送端，全部任务结束后接收端自然收到 None
    drop(tx);

    let (delivered, failures) = tokio::join!(
        drain_chunks(rx, n, &params.tracker),
        join_group(tasks, &group),
    );

    let artifacts: Vec<Option<PathBuf>> = slots.iter().map(ArtifactSlot::take).collect();

    let result = match failures.primary {
        Some(e) => Err(e),
        None if delivered.iter().all(Option::is_some) => {
            Ok(delivered.into_iter().flatten().collect())
        }
        None if failures.saw_cancel || group.is_cancelled() => Err(FetchError::Cancelled),
        None => {
            let index = delivered.iter().position(Option::is_none).unwrap_or_default();
            Err(FetchError::MissingChunk { index })
        }
    };

    FetchGroupOutcome { artifacts, result }
}

/// 把分片交给编排方；组已取消时不再交付，作为取消失败返回，临时文件仍在槽位中。
async fn publish(
    chunk: FetchedChunk,
    tx: &mpsc::Sender<FetchedChunk>,
    token: &CancellationToken,
) -> ChunkTaskResult {
    let permit = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        permit = tx.reserve() => permit.ok(),
    };

    match permit {
        Some(permit) => {
            permit.send(chunk);
            Ok(())
        }
        None => Err(ChunkFailure::new(chunk.index, FetchError::Cancelled)),
    }
}

/// 与生产并行地接收分片，按序号放入槽位。
async fn drain_chunks(
    mut rx: mpsc::Receiver<FetchedChunk>,
    n: usize,
    tracker: &ProgressTracker,
) -> Vec<Option<FetchedChunk>> {
    let mut slots: Vec<Option<FetchedChunk>> = vec![None; n];

    while let Some(chunk) = rx.recv().await {
        tracker.chunk_done(&chunk).await;
        let index = chunk.index;
        match slots.get_mut(index) {
            Some(slot) => *slot = Some(chunk),
            None => warn!(index, "chunk index out of plan range, dropped"),
        }
    }

    slots
}

#[derive(Default)]
struct GroupFailures {
    primary: Option<FetchError>,
    saw_cancel: bool,
}

impl GroupFailures {
    fn record(&mut self, error: FetchError, group: &CancellationToken) {
        if error.is_cancelled() {
            self.saw_cancel = true;
            return;
        }
        if self.primary.is_some() {
            debug!(%error, "additional chunk failure");
            return;
        }

        warn!(%error, "chunk failed, cancelling remaining chunks");
        group.cancel();
        self.primary = Some(error);
    }
}

/// 等待全部任务结束；第一个真实失败会取消整组。
async fn join_group(
    mut tasks: JoinSet<ChunkTaskResult>,
    group: &CancellationToken,
) -> GroupFailures {
    let mut failures = GroupFailures::default();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => failures.record(failure.error, group),
            Err(e) => failures.record(FetchError::TaskJoin(e), group),
        }
    }

    failures
}
