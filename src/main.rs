use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screen_recorder::{
    create_router, AppState, Config, DirectorySink, PlatformFactory, RecorderController,
    StopOutcome,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "screen-recorder", version, about = "Screen recording controller")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/screen-recorder")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the recorder controls over HTTP
    Serve,
    /// Record for a fixed time and export the result
    Record {
        /// Recording length in seconds
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,

        /// Output directory (overrides export.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Screen Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Capture platform: {:?}", cfg.capture.source);

    let platform = PlatformFactory::create(&cfg.capture).context("Failed to create capture platform")?;
    let recorder = RecorderController::new(platform, cfg.recorder.clone());

    match cli.command {
        Command::Serve => {
            let sink = DirectorySink::new(cfg.export.output_dir.clone());
            let app = create_router(AppState::new(recorder, sink));

            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("HTTP server listening on {}", addr);
            axum::serve(listener, app).await.context("HTTP server failed")?;
        }

        Command::Record { seconds, output } => {
            let sink = DirectorySink::new(output.unwrap_or(cfg.export.output_dir.clone()));

            recorder.start().await.context("Failed to start recording")?;
            info!("Recording for {} seconds", seconds);
            tokio::time::sleep(Duration::from_secs(seconds)).await;

            if let StopOutcome::Stopped(summary) = recorder.stop().await? {
                info!(
                    "Captured {} fragments ({} bytes)",
                    summary.fragments, summary.bytes
                );
            }

            match recorder.export(&sink).await? {
                Some(artifact) => info!(
                    "Recording saved to {}",
                    sink.path_for(&artifact.file_name)?.display()
                ),
                None => warn!("Nothing was recorded"),
            }
        }
    }

    Ok(())
}
