use std::process;
use std::sync::Arc;

use anyhow::Context;
use courier_core::callbacks::FetchJson;
use courier_core::typed::codec;
use courier_core::app::WorkerEndpoint;
use courier_core::{
    Callback, CallbackMessage, CallbackObject, CallbackRegistry, Controller, CourierConfig,
    Message, RegistryBuilder, Response, Worker, WorkerHandle, channel,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

enum Command {
    Demo { urls: Vec<String> },
    Worker,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            eprintln!("Usage: courier demo <url>...");
            eprintln!("       courier worker");
            eprintln!();
            eprintln!("Commands:");
            eprintln!("  demo <url>...   Fetch each URL through an in-process worker");
            eprintln!("  worker          Serve callback requests as JSON lines on stdin/stdout");
            process::exit(2);
        }
    };

    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(command)) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut rest = args.iter().skip(1); // skip argv[0]
    match rest.next().map(String::as_str) {
        Some("demo") => {
            let urls: Vec<String> = rest.cloned().collect();
            if urls.is_empty() {
                return Err("demo requires at least one <url>".to_string());
            }
            Ok(Command::Demo { urls })
        }
        Some("worker") => match rest.next() {
            Some(arg) => Err(format!("unexpected argument: {arg}")),
            None => Ok(Command::Worker),
        },
        Some("--help" | "-h") => Err(String::new()),
        Some(other) => Err(format!("unknown command: {other}")),
        None => Err("missing command".to_string()),
    }
}

/// RUST_LOG wins; otherwise COURIER_LOG picks the level. LOG_FORMAT=json
/// switches to JSON lines. Always stderr: stdout carries protocol messages.
fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match std::env::var("COURIER_LOG").as_deref() {
            Ok("debug") => "debug",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("courier_core={level},courier={level}"))
    };

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = CourierConfig::from_env()?;
    let registry = build_registry(&config)?;

    match command {
        Command::Demo { urls } => run_demo(&config, registry, urls).await,
        Command::Worker => run_worker(&config, registry).await,
    }
}

fn build_registry(config: &CourierConfig) -> anyhow::Result<CallbackRegistry> {
    let fetch = FetchJson::new(config).context("building http client")?;
    let registry = RegistryBuilder::new()
        .register(fetch)?
        .expect(&[FetchJson::NAME])
        .build()?;
    Ok(registry)
}

/// Controller and worker in one process; prints each outcome as a wire line.
async fn run_demo(
    config: &CourierConfig,
    registry: CallbackRegistry,
    urls: Vec<String>,
) -> anyhow::Result<()> {
    let (controller_end, worker_end) = channel(config.channel_capacity);
    let worker = Worker::new(Arc::new(registry)).spawn(worker_end);
    let controller = Controller::spawn(controller_end);

    let mut pending = Vec::with_capacity(urls.len());
    for url in urls {
        let msg = CallbackMessage::new(controller.next_id(), FetchJson::NAME, url.into());
        pending.push(controller.send(msg).await?);
    }

    let mut failed = 0;
    for call in pending {
        let response = call.wait().await?;
        if !response.is_success() {
            failed += 1;
        }
        println!("{}", codec::encode_line(&Message::from(response))?);
    }

    drop(controller);
    let stats = worker.stats();
    worker.join().await;
    info!(succeeded = stats.succeeded, failed, "demo finished");
    Ok(())
}

/// Isolated worker process: one `Message` per line on stdin, responses on stdout.
async fn run_worker(config: &CourierConfig, registry: CallbackRegistry) -> anyhow::Result<()> {
    serve_lines(
        registry,
        config.channel_capacity,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Feed request lines from `reader` to a worker and write its responses to
/// `writer`, one line each. Returns once `reader` hits EOF and every accepted
/// request has been answered.
async fn serve_lines<R, W>(
    registry: CallbackRegistry,
    capacity: usize,
    reader: R,
    writer: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel(capacity);
    let (resp_tx, resp_rx) = mpsc::channel(capacity);
    let worker: WorkerHandle =
        Worker::new(Arc::new(registry)).spawn(WorkerEndpoint::new(req_rx, resp_tx));

    let writer = tokio::spawn(write_responses(resp_rx, writer));

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("reading requests")? {
        if line.trim().is_empty() {
            continue;
        }
        let msg = match codec::decode_line::<Message>(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable line");
                continue;
            }
        };
        let id = msg.id();
        let Some(request) = msg.into_request() else {
            warn!(%id, "ignoring non-request message");
            continue;
        };
        if req_tx.send(request).await.is_err() {
            break;
        }
    }

    // input closed: let in-flight callbacks finish, then flush their responses
    drop(req_tx);
    worker.join().await;
    writer.await.context("response writer panicked")??;
    Ok(())
}

async fn write_responses<W>(
    mut responses: mpsc::Receiver<Response>,
    mut out: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = responses.recv().await {
        let line = codec::encode_line(&Message::from(response))?;
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
