use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gonyx")]
#[command(about = "Scaffold and inspect Gonyx framework projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new Gonyx application project
    New(NewArgs),
    /// Validate a configuration file
    Check(CheckArgs),
}

#[derive(clap::Args)]
pub struct NewArgs {
    /// Project (and directory) name
    pub name: String,
    /// Parent directory to create the project in
    #[arg(long, default_value = ".")]
    pub dir: String,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Configuration file path
    #[arg(long, default_value = "gonyx.toml")]
    pub config: String,
}
