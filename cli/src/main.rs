use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use async_trait::async_trait;
use clap::Parser;
use clap::Subcommand;
use shoplens_core::CaptureError;
use shoplens_core::CaptureSource;
use shoplens_core::CapturedImage;
use shoplens_core::Credential;
use shoplens_core::IdentifyClient;
use shoplens_core::ImagePurpose;
use shoplens_core::Remediation;
use shoplens_core::ScanOrchestrator;
use shoplens_core::ScanPhase;
use shoplens_core::ScanResult;
use shoplens_core::shopping_links;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(
    name = "shoplens",
    about = "Point ShopLens at a product photo and get shoppable matches."
)]
struct Cli {
    /// Gemini API key; overrides the GEMINI_API_KEY environment default.
    #[arg(long = "api-key", value_name = "KEY", global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Identify the product in a JPEG photo.
    Scan {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Run a scan without a capture source; settles on a catalog sample.
    Demo,
}

/// File-backed capture source: "captures" the one frame stored at `path`.
struct FileCaptureSource {
    path: PathBuf,
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    fn has_live_capture(&self) -> bool {
        true
    }

    async fn capture_frame(&self) -> Result<CapturedImage, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| CaptureError::Device(format!("{}: {err}", self.path.display())))?;
        CapturedImage::from_jpeg_bytes(&bytes, ImagePurpose::Identification)
    }
}

struct NoCaptureSource;

#[async_trait]
impl CaptureSource for NoCaptureSource {
    fn has_live_capture(&self) -> bool {
        false
    }

    async fn capture_frame(&self) -> Result<CapturedImage, CaptureError> {
        Err(CaptureError::Device("no capture device".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let credential = Credential::resolve(cli.api_key.as_deref());
    let orchestrator = ScanOrchestrator::new(IdentifyClient::new());

    let printer = spawn_progress_printer(orchestrator.progress(), orchestrator.phases());
    let terminal = match cli.command {
        Command::Scan { image } => {
            orchestrator
                .run_scan(&FileCaptureSource { path: image }, credential)
                .await?
        }
        Command::Demo => orchestrator.run_scan(&NoCaptureSource, credential).await?,
    };
    printer.abort();
    eprintln!();

    match terminal {
        ScanPhase::Settled(result) => {
            render_result(&result);
            Ok(())
        }
        ScanPhase::Failed {
            message,
            remediation,
        } => {
            if remediation == Remediation::ConfigureCredential {
                eprintln!("{message}");
                bail!("set GEMINI_API_KEY or pass --api-key to enable identification");
            }
            bail!(message);
        }
        other => bail!("scan ended in unexpected phase: {other:?}"),
    }
}

fn render_result(result: &ScanResult) {
    println!("{} — {}", result.brand, result.name);
    println!("Price: {}   Confidence: {}", result.price, result.confidence);
    println!(
        "Source: {}",
        if result.ai_powered {
            "AI identification"
        } else {
            "sample catalog"
        }
    );
    println!();
    println!("Shop this item:");
    for link in shopping_links(&result.name) {
        println!("  {:<16} {}", link.retailer, link.url);
    }
}

fn spawn_progress_printer(
    mut progress: watch::Receiver<u8>,
    mut phases: watch::Receiver<ScanPhase>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = progress.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let pct = *progress.borrow_and_update();
                    eprint!("\rScanning... {pct:>3}%");
                }
                changed = phases.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let label = phase_label(&phases.borrow_and_update());
                    eprint!("\r{label:<24}");
                }
            }
        }
    })
}

fn phase_label(phase: &ScanPhase) -> &'static str {
    match phase {
        ScanPhase::Idle => "Ready",
        ScanPhase::Capturing => "Capturing frame...",
        ScanPhase::AwaitingIdentification => "Identifying...",
        ScanPhase::Reconciling => "Almost there...",
        ScanPhase::Settled(_) => "Done",
        ScanPhase::Failed { .. } => "Scan failed",
    }
}

fn setup_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
