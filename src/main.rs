use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use multi_source_downloader::SegmentedDownloader;
use multi_source_downloader::config::{DEFAULT_CHUNK_COUNT, DownloadConfig};

/// 多分片并发下载器：按字节区间切片并发拉取，再按序合并为一个文件。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 要下载的资源地址
    #[arg(short, long, env = "MSD_URL")]
    url: String,

    /// 分片数，同时也是并发请求数
    #[arg(
        short,
        long,
        env = "MSD_CHUNKS",
        default_value_t = DEFAULT_CHUNK_COUNT as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    chunks: u64,

    /// 最终文件所在目录
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// 最终文件名；不指定时使用服务器建议的文件名或自动生成
    #[arg(long)]
    name: Option<String>,

    /// 分片临时文件目录；默认使用系统临时目录
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let chunk_count = usize::try_from(args.chunks).context("分片数超出范围")?;
    let mut config = DownloadConfig::new(&args.url)
        .context("无效的下载地址")?
        .chunk_count(chunk_count)
        .output_dir(&args.output_dir);
    if let Some(name) = args.name {
        config = config.output_name(name);
    }
    if let Some(dir) = args.temp_dir {
        config = config.temp_dir(dir);
    }

    let token = CancellationToken::new();
    forward_shutdown_signals(token.clone());

    let report = SegmentedDownloader::new(config)
        .with_cancel_token(token)
        .send()
        .await;

    for e in &report.cleanup_errors {
        warn!(error = %e, "cleanup");
    }

    let elapsed = report.elapsed;
    let path = report.into_result().context("下载失败")?;

    info!(path = %path.display(), "saved");
    println!("Time elapsed: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

/// 收到 SIGINT / SIGTERM 时取消下载，由下载流程自行收尾。
fn forward_shutdown_signals(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown().await;
        warn!("shutdown signal received, cancelling download");
        token.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
