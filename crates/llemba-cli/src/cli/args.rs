use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "llemba",
    version,
    about = "Score machine translation quality with a hosted LLM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score every row of a JSONL file
    Score(ScoreArgs),
    /// List the built-in scoring methods
    Methods,
    /// Print the prompts a method would send, without calling the endpoint
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Scoring method, e.g. LLEMBA-DA or LLEMBA-stars_ref
    #[arg(long)]
    pub method: String,

    /// JSONL rows: source_seg, target_seg, source_lang, target_lang [, reference_seg]
    #[arg(long)]
    pub input: PathBuf,

    /// Use language fields as given instead of expanding known ISO codes (de -> German)
    #[arg(long)]
    pub keep_lang_codes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output JSONL path (default: stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// YAML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub model: Option<String>,

    /// together|openai|fake
    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub api_url: Option<String>,

    /// Completions sampled per request
    #[arg(long)]
    pub samples: Option<u32>,

    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Keep responses in memory only for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Log every sampled answer
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: InputArgs,
}
