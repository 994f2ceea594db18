use calltree::data::functions_from_file;
use calltree::prelude::*;
use clap::{Parser, ValueEnum};
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Resolve an application description into a call tree
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the application description JSON file (`{ functions, app }`)
    description_path: String,

    /// Optional extra function pool merged over the description's functions
    #[arg(short, long)]
    functions: Option<String>,

    /// Optional builder configuration JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Optional queue table JSON file (`{ functions: {..}, topics: {..} }`)
    #[arg(short, long)]
    queues: Option<String>,

    /// How to print the resolved tree
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print debug diagnostics from the resolver
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));
    runtime.block_on(run(cli));
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let load_start = Instant::now();
    let description = AppDescription::from_file(&cli.description_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load description: {}", e)));
    let extra_functions = cli.functions.as_deref().map(|path| {
        functions_from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load functions: {}", e)))
    });
    let config = match cli.config.as_deref() {
        Some(path) => BuilderConfig::from_json(&read_file(path))
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse config: {}", e))),
        None => BuilderConfig::default(),
    };
    let queues = match cli.queues.as_deref() {
        Some(path) => QueueTable::from_json(&read_file(path))
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse queue table: {}", e))),
        None => QueueTable::new(),
    };
    let load_duration = load_start.elapsed();

    // --- 2. Builder Setup ---
    let mut builder_setup = TreeBuilder::builder().with_config(config);
    if !queues.is_empty() {
        let queues = Arc::new(queues);
        builder_setup = builder_setup
            .with_async_resolver(queues.clone())
            .with_topic_resolver(queues);
    }
    let mut builder = builder_setup.build();
    let root = description.register(&mut builder);
    if let Some(functions) = extra_functions {
        builder.define_functions(functions);
    }
    eprintln!(
        "Registered {} functions from '{}'",
        builder.registry().len(),
        cli.description_path
    );

    // --- 3. Resolution ---
    let build_start = Instant::now();
    let tree = builder
        .build(&root)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Resolution failed: {}", e)));
    let build_duration = build_start.elapsed();

    // --- 4. Output ---
    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&*tree)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize tree: {}", e)));
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", TreeFormatter::format_tree(&tree)),
    }

    eprintln!("\n--- Performance Summary ---");
    eprintln!("File Loading:         {:?}", load_duration);
    eprintln!("Resolution:           {:?}", build_duration);
    eprintln!("-----------------------------");
    eprintln!("Total Execution:      {:?}", total_start.elapsed());
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read file '{}': {}", path, e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
