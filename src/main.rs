use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use c4stage::c4::OutputFormat;
use c4stage::config::Config;
use c4stage::server;
use c4stage::services::{render_catalog, DiagramKind, RenderOptions};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve diagrams over HTTP
    Serve {
        #[clap(flatten)]
        config: Config,
    },
    /// Render a diagram from catalog-info.yaml files
    Render {
        #[clap(short, long)]
        catalog: PathBuf,
        #[clap(short, long, value_enum, default_value = "context")]
        diagram: DiagramArg,
        /// System to draw, required for the system diagram
        #[clap(long)]
        system: Option<String>,
        #[clap(long, default_value = "0")]
        scale: f64,
        #[clap(short, long, default_value = "puml")]
        format: String,
        #[clap(long, env = "C4STAGE_PLANTUML_SERVER", default_value = "http://localhost:9090")]
        plantuml_server: String,
        /// Output file, stdout when omitted
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DiagramArg {
    Context,
    Container,
    System,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Serve { config } => {
            info!("Welcome to C4 Stage, starting server on port {}", config.port);
            server::start_server(config).await?;
        }
        Commands::Render {
            catalog,
            diagram,
            system,
            scale,
            format,
            plantuml_server,
            output,
        } => {
            let kind = match (diagram, system) {
                (DiagramArg::Context, _) => DiagramKind::Context,
                (DiagramArg::Container, _) => DiagramKind::LandscapeContainer,
                (DiagramArg::System, Some(name)) => DiagramKind::SystemContainer(name),
                (DiagramArg::System, None) => {
                    anyhow::bail!("--system is required for the system diagram")
                }
            };

            let options = RenderOptions {
                catalog_dir: catalog,
                kind,
                scale,
                format: OutputFormat::from_query(Some(&format)),
                plantuml_server,
            };
            info!("Rendering {:?} from {}", options.kind, options.catalog_dir.display());
            let bytes = render_catalog(&options).await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    info!("Wrote {}", path.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("handlebars=off,{}", log_level)))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
