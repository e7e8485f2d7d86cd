use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use arrival_core::config::Config;
use arrival_core::navigator::Navigator;
use arrival_core::provider::SourceFileProvider;
use arrival_core::replay::{self, ReplayScript};
use arrival_core::symbol::DocumentSymbol;
use arrival_core::view;

#[derive(Parser)]
#[command(name = "arrival", about = "Navigation history as a forest of arrival trees")]
struct Cli {
    /// Log decisions at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a scripted editing session and print the resulting history
    Replay {
        /// TOML replay script
        script: PathBuf,

        /// Config file (defaults to ~/.arrival/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "tree")]
        format: OutputFormat,
    },
    /// Print the symbol outline extracted for a source file
    Outline {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Tree,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose { "arrival=debug" } else { "arrival=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Replay {
            script,
            config,
            format,
        } => run_replay(&script, config.as_deref(), format).await,
        Command::Outline { file } => run_outline(&file),
    }
}

async fn run_replay(
    script_path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path)?;
    let script = ReplayScript::load(script_path)?;
    let base_dir = script_path.parent().unwrap_or_else(|| Path::new("."));

    tracing::info!(script = %script_path.display(), steps = script.steps.len(), "replaying");

    let navigator = Navigator::new(SourceFileProvider::default());
    let mut options = config.repr_options();
    let colors = config.color_options();
    replay::run(&script, base_dir, &navigator, &mut options).await?;

    let output = navigator.with_recorder(|recorder| -> anyhow::Result<String> {
        let arrivals = recorder.arrivals();
        match format {
            OutputFormat::Tree => {
                let items = view::to_tree_items(arrivals, &options);
                let mut text = view::render_text(arrivals, &items, &options, &colors);
                if let Some(status) = view::status_text(arrivals) {
                    text.push_str(&status);
                    text.push('\n');
                }
                Ok(text)
            }
            OutputFormat::Json => serde_json::to_string_pretty(&arrivals.snapshot())
                .context("failed to serialize history"),
        }
    })??;

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_outline(file: &Path) -> anyhow::Result<()> {
    let source =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let outline = SourceFileProvider::default().outline(file, &source)?;
    if outline.is_empty() {
        tracing::warn!(file = %file.display(), "no symbols found");
    }
    print_outline(&outline, 0);
    Ok(())
}

fn print_outline(symbols: &[DocumentSymbol], depth: usize) {
    for symbol in symbols {
        let start = symbol.range.start;
        let end = symbol.range.end;
        println!(
            "{:indent$}{} {} [{}:{}-{}:{}]",
            "",
            symbol.kind.as_str(),
            symbol.name,
            start.line + 1,
            start.character + 1,
            end.line + 1,
            end.character + 1,
            indent = depth * 2
        );
        print_outline(&symbol.children, depth + 1);
    }
}
