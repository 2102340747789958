mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use memrank::{Config, EmbeddingProvider, Error, MemoryStore, OnnxEmbedder, StoreOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::Commands;
use output::{print_json, ErrorResponse};

/// Variable holding the log filter directive (e.g. `debug`, `memrank=trace`).
const LOG_ENV: &str = "MEMRANK_LOG";

/// memrank - hybrid BM25 + vector memory store
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Never load the embedding model; search is BM25 only
    #[arg(long, global = true)]
    lexical_only: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                print_json(&ErrorResponse {
                    error: e.to_string(),
                });
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    if !cli.command.needs_store() {
        return commands::execute(&cli.command, None, &Config::default(), cli.json);
    }

    let config = Config::load()?;
    config.ensure_directories()?;

    let provider = load_provider(cli, &config)?;
    let options = StoreOptions::new(&config.database_path)
        .with_boxed_provider(provider)
        .use_vectors(config.use_vectors);
    let mut store = MemoryStore::open(options)?.with_rrf_config(config.rrf_config());

    let code = commands::execute(&cli.command, Some(&mut store), &config, cli.json)?;
    store.close()?;
    Ok(code)
}

/// Load the ONNX model only when the command will embed something.
fn load_provider(cli: &Cli, config: &Config) -> Result<Option<Box<dyn EmbeddingProvider>>, Error> {
    if cli.lexical_only || !config.use_vectors {
        info!("embedding model disabled, running lexical-only");
        return Ok(None);
    }
    if !cli.command.uses_embeddings() {
        return Ok(None);
    }

    match OnnxEmbedder::new(&config.embedding_model, &config.model_cache) {
        Ok(embedder) => Ok(Some(Box::new(embedder))),
        Err(e) => {
            warn!(error = %e, model = %config.embedding_model, "embedding model unavailable");
            Err(e.into())
        }
    }
}
