//! Clap derive structures for the `scenebridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// scenebridge -- mirror gateway scenes into a state tree
#[derive(Debug, Parser)]
#[command(
    name = "scenebridge",
    version,
    about = "Bridge device-gateway scenes to a hierarchical state tree",
    long_about = "Binds every configured scene to scenes.<id>.{productsCount,run,stop}\n\
        in an in-memory state tree, keeps both sides in sync, and lets you\n\
        inspect the tree or press the run/stop command leaves.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SCENEBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one entry per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bind the configured scenes and print the resulting state tree
    #[command(alias = "t")]
    Tree(TreeArgs),

    /// Request a write on a scene's run or stop leaf
    #[command(alias = "p")]
    Press(PressArgs),

    /// Bind the configured scenes and stream every state change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Only show entries at or below this path (e.g. scenes.3)
    #[arg(long, short = 'r')]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneAction {
    Run,
    Stop,
}

#[derive(Debug, Args)]
pub struct PressArgs {
    /// Scene id
    pub scene: String,

    /// Command leaf to write
    #[arg(value_enum)]
    pub action: SceneAction,

    /// Value to request
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub value: bool,

    /// Extra time to wait for the scene after its action delay (ms)
    #[arg(long, default_value = "50")]
    pub wait_ms: u64,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many milliseconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// Request a write once bound, as <scene>:<run|stop> (repeatable)
    #[arg(long = "press", value_name = "SCENE:ACTION")]
    pub presses: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
