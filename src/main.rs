use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bolo_gateway::api::ApiServer;
use bolo_gateway::assistant::Assistant;
use bolo_gateway::intent::IntentExtractor;
use bolo_gateway::language::LanguageDetector;
use bolo_gateway::{Config, db};

/// Bolo - Urdu and English voice ordering gateway
#[derive(Parser)]
#[command(name = "bolo", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve,
    /// Detect the language of a text
    Detect {
        /// Text to analyze
        text: String,
    },
    /// Extract the intent of a text
    Intent {
        /// Text to classify
        text: String,
    },
    /// Recognize an audio file and print the understood turn
    Transcribe {
        /// Audio file (wav, flac, ogg, opus, webm, mp3)
        file: PathBuf,
        /// Audio encoding (defaults from the file extension)
        #[arg(long)]
        encoding: Option<String>,
        /// Sample rate in hertz
        #[arg(long)]
        sample_rate: Option<u32>,
        /// Language code to try first, or `auto`
        #[arg(long, default_value = "auto")]
        language: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,bolo_gateway=info",
        1 => "info,bolo_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.port).await,
        Command::Detect { text } => detect(&text),
        Command::Intent { text } => intent(&text).await,
        Command::Transcribe {
            file,
            encoding,
            sample_rate,
            language,
        } => transcribe(&file, encoding, sample_rate, language).await,
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let port = port.unwrap_or(config.api_server.port);

    let db_path = config.db_path();
    let pool = db::init(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let assistant = Assistant::from_config(&config, pool.clone())?;

    tracing::info!(
        port,
        llm = ?config.llm.provider,
        model = %config.llm.model,
        data_dir = %config.data_dir.display(),
        "starting bolo gateway"
    );

    let server = ApiServer::new(pool, assistant, port);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

fn detect(text: &str) -> anyhow::Result<()> {
    let detection = LanguageDetector::default().analyze(text);
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}

async fn intent(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let completion = bolo_gateway::llm::from_config(&config.llm, &config.api_keys);
    let extractor =
        IntentExtractor::with_provider(completion, Arc::new(LanguageDetector::default()));

    let intent = extractor.extract(text, "auto").await;
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

async fn transcribe(
    file: &Path,
    encoding: Option<String>,
    sample_rate: Option<u32>,
    language: String,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let assistant = Assistant::from_config(&config, db::init_memory()?)?;
    let defaults = assistant.default_audio();

    let options = bolo_gateway::speech::AudioOptions {
        encoding: encoding
            .or_else(|| encoding_for(file).map(ToString::to_string))
            .unwrap_or_else(|| defaults.encoding.clone()),
        sample_rate_hertz: sample_rate.unwrap_or(defaults.sample_rate_hertz),
        language,
        enable_auto_detection: defaults.enable_auto_detection,
    };

    let turn = assistant.process_voice(&audio, &options, None, false).await?;
    println!("{}", serde_json::to_string_pretty(&turn)?);
    Ok(())
}

/// Recognition encoding implied by a file extension
fn encoding_for(file: &Path) -> Option<&'static str> {
    let ext = file.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("LINEAR16"),
        "flac" => Some("FLAC"),
        "ogg" | "opus" => Some("OGG_OPUS"),
        "webm" => Some("WEBM_OPUS"),
        "mp3" => Some("MP3"),
        _ => None,
    }
}
