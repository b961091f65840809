use anyhow::{Context, Result};
use clap::Parser;
use morph_render::from_json::template_from_json;
use morph_render::json::{morph_to_json, validation_errors_to_json, JsonStyle};
use morph_render::{validate_template, Renderer, TextEnvironment, Value};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "morph-render",
    version = env!("CARGO_PKG_VERSION"),
    about = "Render a compiled template against a JSON context"
)]
struct Cli {
    /// Compiled template (JSON)
    #[arg(short, long)]
    template: PathBuf,

    /// Context JSON; read from stdin when omitted
    #[arg(short, long)]
    context: Option<PathBuf>,

    /// Second context to re-render incrementally with after the first pass
    #[arg(short, long)]
    update: Option<PathBuf>,

    /// Print the morph tree as JSON instead of the rendered text
    #[arg(long)]
    json: bool,

    /// With `--json`, print the morph tree on a single line
    #[arg(long, requires = "json")]
    compact: bool,

    /// Log filter, e.g. `debug` or `morph_render=trace` (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let source = std::fs::read_to_string(&cli.template)
        .with_context(|| format!("reading template {}", cli.template.display()))?;
    let template = template_from_json(&source)
        .with_context(|| format!("decoding template {}", cli.template.display()))?;

    let errors = validate_template(&template);
    if !errors.is_empty() {
        eprintln!("{}", validation_errors_to_json(&errors));
        std::process::exit(1);
    }

    let context = match &cli.context {
        Some(path) => read_context(path)?,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            parse_context(&input).context("parsing context from stdin")?
        }
    };

    let mut renderer = Renderer::new(template, TextEnvironment::with_builtin_helpers(), context);
    renderer.render()?;
    info!(morphs = renderer.root().count(), "rendered");

    if let Some(path) = &cli.update {
        let context = read_context(path)?;
        renderer.update(context);
        renderer.rerender()?;
        info!("re-rendered");
    }

    if cli.json {
        let style = if cli.compact {
            JsonStyle::Compact
        } else {
            JsonStyle::Pretty
        };
        println!("{}", morph_to_json(renderer.root(), style));
    } else {
        println!("{}", renderer.output());
    }
    Ok(())
}

fn read_context(path: &Path) -> Result<Value> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("reading context {}", path.display()))?;
    parse_context(&input).with_context(|| format!("parsing context {}", path.display()))
}

fn parse_context(input: &str) -> Result<Value> {
    if input.trim().is_empty() {
        return Ok(Value::Null);
    }
    let json: serde_json::Value = serde_json::from_str(input)?;
    Ok(Value::from(json))
}
