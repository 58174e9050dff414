use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use topic_model_explorer::analysis::DatasetSummary;
use topic_model_explorer::{format_level, ModelSet};

/// Topic-model evaluation explorer: synthesize and inspect scatter datasets
#[derive(Parser)]
#[command(name = "topic-models", version, about)]
struct Cli {
    /// Path to the dataset file
    #[arg(long, default_value = "topic_models.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the sample parameter-grid dataset and write it to disk
    Generate,
    /// List models with their parameters and rank metrics
    Show {
        /// Show only the last N entries (default: 20)
        #[arg(long, default_value_t = 20)]
        last: usize,

        /// Show all entries
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Show dataset statistics
    Status,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate => cmd_generate(&cli.data),
        Commands::Show { last, all } => cmd_show(&cli.data, last, all),
        Commands::Status => cmd_status(&cli.data),
    }
}

fn cmd_generate(path: &Path) {
    println!("Synthesizing the sample parameter grid...");
    let data = ModelSet::sample();
    data.save(path);
    println!(
        "Wrote {} models and {} groups to {:?}",
        data.models.len(),
        data.groups.len(),
        path
    );
}

fn load_or_exit(path: &Path) -> ModelSet {
    match ModelSet::load(path) {
        Some(data) => data,
        None => {
            eprintln!(
                "No dataset at {:?}. Run `cargo run -- generate` first.",
                path
            );
            std::process::exit(1);
        }
    }
}

fn cmd_show(path: &Path, last: usize, all: bool) {
    let data = load_or_exit(path);
    let total = data.models.len();
    let skip = if all { 0 } else { total.saturating_sub(last) };

    if skip > 0 {
        println!("... ({} earlier models, use --all to view)", skip);
    }
    for m in data.models.iter().skip(skip) {
        println!(
            "{:<18} alpha={:<5} beta={:<5} num_topics={:<3} mean rank {:>5.1}  best rank {:>3.0}",
            m.id,
            format_level(m.alpha),
            format_level(m.beta),
            format_level(m.num_topics),
            m.mean_rank,
            m.best_rank
        );
    }
}

fn cmd_status(path: &Path) {
    let data = load_or_exit(path);
    let s = DatasetSummary::compute(&data);

    println!("Models:            {}", s.total_models);
    println!(
        "Groups:            {} ({} single-fixed, {} double-fixed)",
        s.total_groups, s.single_fixed_groups, s.double_fixed_groups
    );
    println!(
        "Mean rank range:   {:.1} .. {:.1}",
        s.mean_rank_min, s.mean_rank_max
    );
    println!(
        "Best rank range:   {:.0} .. {:.0}",
        s.best_rank_min, s.best_rank_max
    );
}
