mod cli;
mod scaffold;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("gonyx: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::New(args) => {
            let root = scaffold::create_project(&args.name, Path::new(&args.dir))?;
            println!("Created project at {}", root.display());
            println!("  cd {} && cargo run", args.name);
        }
        Commands::Check(args) => {
            let cfg = gonyx_config::load_config(Some(&args.config))?;
            println!(
                "OK: {} ({} http server(s), {} sql instance(s), {} redis instance(s))",
                args.config,
                cfg.http.servers.len(),
                cfg.sql.len(),
                cfg.redis.len(),
            );
        }
    }

    Ok(())
}
