use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Classify(ClassifyArgs),
    Edit(EditArgs),
    Register(RegisterArgs),
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// PDF file to classify.
    #[arg(long)]
    pub pdf: String,

    /// Output file for the classification list (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite `--out` if it already exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Analysis service base URL (overrides DOCCLASSIFY_ANALYSIS_URL).
    #[arg(long)]
    pub analysis_url: Option<String>,

    /// Categories the analysis must include.
    #[arg(long)]
    pub classification_prompt: Option<String>,

    /// Per-request upstream timeout; 0 waits forever.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Classification list JSON (created by `classify`).
    #[arg(long)]
    pub input: String,

    /// JSON-lines file of editor commands, applied in order.
    #[arg(long)]
    pub commands: String,

    /// Output file for the edited list.
    #[arg(long)]
    pub out: String,

    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Classification list JSON to submit.
    #[arg(long)]
    pub input: String,

    /// Base URL of a running `docclassify-app`.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}
