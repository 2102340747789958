//! Command handlers for the memrank CLI.

use std::process::ExitCode;

use memrank::{
    AddOptions, Config, Error, MemoryStore, Metadata, SearchOptions, SearchResult,
};

use crate::output::*;

/// Which ranking `search` runs.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// BM25 and vector rankings fused with RRF, degrading to BM25 alone
    #[default]
    Hybrid,
    /// Lexical BM25 only
    Bm25,
    /// Cosine similarity only (needs the embedding model)
    Vector,
}

/// Commands supported by memrank CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a memory
    Add {
        /// Memory text content
        text: String,

        /// Optional JSON object metadata
        #[arg(short = 'm', long)]
        metadata: Option<String>,

        /// Store under this id, replacing any memory that already has it
        #[arg(long)]
        id: Option<String>,

        /// Skip embedding even when the model is available
        #[arg(long)]
        no_embed: bool,
    },
    /// Search memories
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results (default: 5)
        #[arg(short = 'l', long, default_value = "5")]
        limit: usize,

        /// Ranking to run
        #[arg(long, value_enum, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,

        /// Weight of the BM25 ranking (hybrid mode)
        #[arg(long)]
        bm25_weight: Option<f64>,

        /// Weight of the vector ranking (hybrid mode)
        #[arg(long)]
        vector_weight: Option<f64>,

        /// Drop hybrid results scoring below this
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Show one memory
    Get {
        /// Memory ID
        id: String,
    },
    /// List memories, newest first
    List {
        /// Maximum number of results (default: 10)
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,
    },
    /// Delete a memory
    Delete {
        /// Memory ID
        id: String,
    },
    /// Show memory counts
    Stats,
    Version,
}

impl Commands {
    /// Commands that never touch the store.
    pub fn needs_store(&self) -> bool {
        !matches!(self, Commands::Version)
    }

    /// Commands that embed text and so benefit from loading the model.
    pub fn uses_embeddings(&self) -> bool {
        match self {
            Commands::Add { no_embed, .. } => !no_embed,
            Commands::Search { mode, .. } => *mode != SearchMode::Bm25,
            _ => false,
        }
    }
}

/// Execute a CLI command.
pub fn execute(
    command: &Commands,
    store: Option<&mut MemoryStore>,
    config: &Config,
    json: bool,
) -> Result<ExitCode, Error> {
    let Some(store) = store else {
        return handle_version(json);
    };

    match command {
        Commands::Add {
            text,
            metadata,
            id,
            no_embed,
        } => handle_add(store, text, metadata.as_deref(), id.clone(), *no_embed, json),
        Commands::Search {
            query,
            limit,
            mode,
            bm25_weight,
            vector_weight,
            min_score,
        } => {
            let defaults = config.search_options(*limit);
            let options = SearchOptions {
                bm25_weight: bm25_weight.unwrap_or(defaults.bm25_weight),
                vector_weight: vector_weight.unwrap_or(defaults.vector_weight),
                min_score: min_score.unwrap_or(defaults.min_score),
                ..defaults
            };
            handle_search(store, query, *mode, options, json)
        }
        Commands::Get { id } => handle_get(store, id, json),
        Commands::List { limit } => handle_list(store, *limit, json),
        Commands::Delete { id } => handle_delete(store, id, json),
        Commands::Stats => handle_stats(store, json),
        Commands::Version => handle_version(json),
    }
}

/// Parse `--metadata`, which must be a JSON object.
pub fn parse_metadata(raw: &str) -> Result<Metadata, Error> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::InvalidInput(format!(
            "metadata must be a JSON object, got {}",
            other
        ))),
    }
}

fn handle_add(
    store: &mut MemoryStore,
    text: &str,
    metadata: Option<&str>,
    id: Option<String>,
    no_embed: bool,
    json: bool,
) -> Result<ExitCode, Error> {
    let metadata = metadata.map(parse_metadata).transpose()?;
    let options = AddOptions {
        id,
        embed: !no_embed,
    };

    let memory = store.add(text, metadata, options)?;
    if json {
        print_json(&AddResponse {
            status: if memory.updated_at.is_some() {
                "replaced"
            } else {
                "added"
            },
            embedded: memory.has_embedding(),
            id: memory.id,
        });
    } else {
        println!("Added memory: {}", memory.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search(
    store: &mut MemoryStore,
    query: &str,
    mode: SearchMode,
    options: SearchOptions,
    json: bool,
) -> Result<ExitCode, Error> {
    let results: Vec<SearchResult> = match mode {
        SearchMode::Hybrid => store.search(query, options)?,
        SearchMode::Bm25 => store.search_bm25(query, options.limit)?,
        SearchMode::Vector => store.search_vector(query, options.limit)?,
    };

    if json {
        let results = results.into_iter().map(SearchResultItem::from).collect();
        print_json(&SearchResponse { results });
    } else {
        for result in results {
            println!(
                "{} [{} score: {:.4}]\n  {}\n",
                result.memory.id,
                result.match_type.as_str(),
                result.score,
                result.memory.content
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get(store: &mut MemoryStore, id: &str, json: bool) -> Result<ExitCode, Error> {
    let memory = store
        .get(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    if json {
        print_json(&MemoryResponse::from(memory));
    } else {
        println!("ID: {}", memory.id);
        println!("Content: {}", memory.content);
        if !memory.metadata.is_empty() {
            println!("Metadata: {}", serde_json::Value::Object(memory.metadata.clone()));
        }
        println!("Embedded: {}", memory.has_embedding());
        println!("Created: {}", memory.created_at.to_rfc3339());
        if let Some(updated_at) = memory.updated_at {
            println!("Updated: {}", updated_at.to_rfc3339());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list(store: &mut MemoryStore, limit: usize, json: bool) -> Result<ExitCode, Error> {
    let memories = store.list(Some(limit))?;
    if json {
        let memories = memories.into_iter().map(MemoryResponse::from).collect();
        print_json(&ListResponse { memories });
    } else {
        for memory in memories {
            println!("{}: {}", memory.id, memory.content);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_delete(store: &mut MemoryStore, id: &str, json: bool) -> Result<ExitCode, Error> {
    if !store.delete(id)? {
        return Err(Error::NotFound(id.to_string()));
    }

    if json {
        print_json(&DeleteResponse {
            status: "deleted",
            id: id.to_string(),
        });
    } else {
        println!("Deleted memory: {}", id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_stats(store: &mut MemoryStore, json: bool) -> Result<ExitCode, Error> {
    let stats = store.stats()?;
    if json {
        print_json(&StatsResponse { stats });
    } else {
        println!("Memories: {}", stats.total_memories);
        println!("With embeddings: {}", stats.memories_with_embeddings);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}
