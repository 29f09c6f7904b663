pub mod config;
pub mod input;
pub mod view;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use config::ViewConfig;
use tracing::info;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "msgview",
    version,
    about = "Render agent chat messages into interactive HTML"
)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long, global = true, env = "MSGVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a JSON list of messages to HTML
    Render {
        /// Messages file; stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Print message containers only, without page chrome
        #[arg(long)]
        fragment: bool,

        /// Page title
        #[arg(long, default_value = "Agent conversation")]
        title: String,
    },
    /// Convert plain text to markup with the message pipeline
    Convert {
        /// Text file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            input,
            fragment,
            title,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let raw = read_input(input.as_deref())?;
            let messages = crate::input::parse_messages(&raw).context("reading messages")?;
            let renderer = config.page_renderer();
            let html = if fragment {
                renderer.render_fragment(&messages)
            } else {
                renderer.render_page(&title, &messages)
            };
            write_stdout(&html)
        }
        Commands::Convert { input } => {
            let config = load_config(cli.config.as_deref())?;
            let raw = read_input(input.as_deref())?;
            let text = raw.strip_suffix('\n').unwrap_or(&raw);
            let html = view::convert(text, &config.render_context().host);
            write_stdout(&format!("{html}\n"))
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "msgview", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ViewConfig> {
    let config = ViewConfig::load(path).with_context(|| match path {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading default config".to_string(),
    })?;
    info!(
        component = "config",
        operation = "load",
        explicit = path.is_some(),
        math = config.math,
        "Configuration ready"
    );
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes()).context("writing output")?;
    out.flush().context("flushing output")
}
