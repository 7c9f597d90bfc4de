use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::{bounded, RecvTimeoutError};
use networker::{
    channel_handler, load_config, NetError, NetworkerPool, RequestKind, RequestOutcome,
    RequestParams,
};
use shared::domain::Classification;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Get,
    Post,
    Put,
    Patch,
    PostJson,
    Delete,
    PutOctets,
}

impl From<MethodArg> for RequestKind {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Get => RequestKind::Get,
            MethodArg::Post => RequestKind::Post,
            MethodArg::Put => RequestKind::Put,
            MethodArg::Patch => RequestKind::Patch,
            MethodArg::PostJson => RequestKind::PostJson,
            MethodArg::Delete => RequestKind::Delete,
            MethodArg::PutOctets => RequestKind::PutOctets,
        }
    }
}

/// Send requests through the networker pool and print each outcome as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Target URL; repeat for several requests.
    #[arg(long = "url", required = true)]
    urls: Vec<String>,
    /// Route through the background workers instead of the interactive ones.
    #[arg(long)]
    background: bool,
    #[arg(long, value_enum, default_value_t = MethodArg::Get)]
    method: MethodArg,
    /// Text body for form/JSON methods.
    #[arg(long)]
    body: Option<String>,
    /// File uploaded as raw bytes with `--method put-octets`.
    #[arg(long)]
    body_file: Option<PathBuf>,
    #[arg(long)]
    auth: Option<String>,
    #[arg(long, default_value_t = 0)]
    classification: i32,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn params_for(args: &Args, url: &str, key: u64) -> Result<RequestParams> {
    let mut params = RequestParams::new(args.method.into(), url)
        .with_key(key)
        .with_classification(Classification(args.classification))
        .with_additional_data(url);
    if let Some(auth) = &args.auth {
        params = params.with_authorization(auth.clone());
    }
    if let Some(path) = &args.body_file {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
        params = params.with_bytes(bytes);
    } else if let Some(body) = &args.body {
        params = params.with_text(body.clone());
    }
    Ok(params)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let outcome_wait = config.request_timeout.unwrap_or(Duration::from_secs(60))
        + Duration::from_secs(5);

    let (outcome_tx, outcome_rx) = bounded::<RequestOutcome>(2048);
    let pool = NetworkerPool::new(config, Some(channel_handler(outcome_tx)))?;
    if let Err(err) = pool.init() {
        if matches!(err, NetError::ThreadSpawn { .. }) {
            tracing::error!("networking is unavailable: {err}");
        }
        return Err(err).context("could not start networker threads");
    }
    tracing::debug!(
        workers = pool.config().worker_count,
        interactive = pool.config().interactive_workers,
        "networker pool ready"
    );

    let mut submitted = 0usize;
    for (key, url) in args.urls.iter().enumerate() {
        let params = params_for(&args, url, key as u64)?;
        match pool.submit(!args.background, params) {
            Ok(worker) => {
                tracing::debug!(worker, %url, "submitted");
                submitted += 1;
            }
            Err(err) => tracing::error!(%url, "rejected request: {err}"),
        }
    }

    let mut failed = 0usize;
    for _ in 0..submitted {
        match outcome_rx.recv_timeout(outcome_wait) {
            Ok(outcome) => {
                if !outcome.is_success() {
                    failed += 1;
                }
                println!("{}", serde_json::to_string(&outcome)?);
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("timed out waiting for outstanding requests");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    pool.kill()?;

    if submitted < args.urls.len() || failed > 0 {
        bail!(
            "{} of {} requests did not succeed",
            args.urls.len() - submitted + failed,
            args.urls.len()
        );
    }
    Ok(())
}
