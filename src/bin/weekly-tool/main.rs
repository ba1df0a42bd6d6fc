use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use weekly::config::{find_config_path, read_config, Config, CFG_FILE_NAME};

use crate::check::check_cmd;
use crate::post::post_cmd;

mod check;
mod post;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Creates the post for the week after the latest one
    Post(PostArgs),
    /// Reads every post and reports warnings and unreadable files
    Check,
}

#[derive(Parser, Debug)]
struct PostArgs {
    /// Title of the post, also used for the slug
    #[arg(short, long)]
    title: String,

    /// Summary line. Left empty, the first words of the body are used
    #[arg(short, long)]
    summary: Option<String>,
}

fn load_config(config_path: Option<String>) -> Result<Config> {
    let config_path = config_path.map(PathBuf::from)
        .or_else(find_config_path)
        .ok_or_else(|| anyhow!("Could not find {}", CFG_FILE_NAME))?;
    read_config(&config_path).with_context(|| format!("Could not load {}", config_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config_path)?;

    match args.command {
        Command::Post(post_args) => post_cmd(&config, post_args).await,
        Command::Check => check_cmd(&config).await,
    }
}
