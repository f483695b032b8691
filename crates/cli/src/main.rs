use clap::{Args, Parser, Subcommand};
use console::style;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use batislens_core::model::StatementPath;
use batislens_project::{self, Config, Project, ProjectError, CONFIG_FILE};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new batislens.toml config file
    Init,

    /// Render every statement with its parameter template
    Check,

    /// Write the preview report once and exit
    Run,

    /// Write the preview report and rewrite it on changes
    Watch,

    /// Print the parameter template of a statement
    Template {
        /// Dotted statement path, e.g. com.example.BlogMapper.selectBlog
        statement: String,
    },

    /// Print the SQL a statement renders for some parameters
    Sql {
        /// Dotted statement path, e.g. com.example.BlogMapper.selectBlog
        statement: String,

        #[command(flatten)]
        params: ParamsArgs,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct ParamsArgs {
    /// Parameters as JSON text
    #[arg(long)]
    params: Option<String>,

    /// File holding the parameters as JSON
    #[arg(long)]
    params_file: Option<PathBuf>,
}

impl ParamsArgs {
    fn read(&self) -> std::io::Result<String> {
        match (&self.params, &self.params_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => fs::read_to_string(path),
            (None, None) => Ok(String::new()),
        }
    }
}

const EXAMPLE_CONFIG: &str = r#"version = "1.0"

[mappers]
path = "src/main/resources/mappers/"

[sources]
paths = ["src/main/java/"]

[output]
path = "target/batislens.json"
pretty = true

[engine]
max_depth = 64
max_foreach_iterations = 10000
strict_includes = false
"#;

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init => {
            let config_path = env::current_dir()?.join(CONFIG_FILE);
            if config_path.exists() {
                println!("Config file already exists at {}", config_path.display());
                return Ok(());
            }

            fs::write(&config_path, EXAMPLE_CONFIG)?;
            println!("Created {}", CONFIG_FILE);
            Ok(())
        }
        cmd => match Config::find_and_load(&env::current_dir()?) {
            Ok((config, config_dir)) => {
                env::set_current_dir(&config_dir)?;
                if let Err(err) = execute(cmd, &config, &config_dir) {
                    eprintln!("{} {}", style("✖").red(), err.report());
                    std::process::exit(1);
                }
                Ok(())
            }
            Err(ProjectError::ConfigNotFound(_)) => {
                eprintln!(
                    "Error: No {} found in current directory or parent directories",
                    CONFIG_FILE
                );
                eprintln!("Run 'batislens init' to create a new config file");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("{} {}", style("✖").red(), e.report());
                std::process::exit(1);
            }
        },
    }
}

fn execute(cmd: Commands, config: &Config, config_dir: &Path) -> batislens_project::Result<()> {
    match cmd {
        Commands::Check => {
            println!(
                "  {} Checking mappers from {}",
                style("➜").green(),
                config_dir.display()
            );
            let report = batislens_project::check(config)?;
            println!(
                "  {} All {} statements rendered",
                style("➜").green(),
                report.len()
            );
        }
        Commands::Run => {
            let report = batislens_project::run(config)?;
            let failed = report.failures().count();
            println!(
                "  {} Wrote {} statements to {}",
                style("➜").green(),
                report.len(),
                style(config.output.path.display()).cyan()
            );
            if failed > 0 {
                println!(
                    "  {} {} statements failed to render",
                    style("✖").red(),
                    failed
                );
            }
        }
        Commands::Watch => batislens_project::watch(config)?,
        Commands::Template { statement } => {
            let project = Project::load(config)?;
            let template = project
                .previewer()
                .generate_parameter_template(&StatementPath::parse(&statement))?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        Commands::Sql { statement, params } => {
            let project = Project::load(config)?;
            let sql = project
                .previewer()
                .generate_sql(&StatementPath::parse(&statement), &params.read()?)?;
            println!("{}", sql);
        }
        Commands::Init => unreachable!(),
    }
    Ok(())
}
