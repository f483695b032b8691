//! File-system side of batislens: configuration, mapper discovery, Java
//! source indexing, and the `check`, `run` and `watch` commands.

mod config;
mod error;
mod java;
mod mappers;
mod report;

use std::path::Path;

use tracing::{error, info};

use batislens_core::mapper::MapperRegistry;
use batislens_core::model::StatementPath;
use batislens_core::preview::SqlPreviewer;
use batislens_core::render::RenderOptions;

pub use config::{Config, EngineConfig, MappersConfig, OutputConfig, SourcesConfig, CONFIG_FILE};
pub use error::{ProjectError, Result};
pub use java::JavaIndex;
pub use mappers::load_mappers;
pub use report::{Report, ReportEntry};

/// Everything loaded from a configured project.
#[derive(Debug)]
pub struct Project {
    pub mappers: MapperRegistry,
    pub java: JavaIndex,
    options: RenderOptions,
}

impl Project {
    pub fn load(config: &Config) -> Result<Self> {
        let mappers = load_mappers(&config.mappers.path)?;
        let java = JavaIndex::scan(&config.sources.paths)?;
        info!(
            classes = java.class_count(),
            signatures = java.signature_count(),
            "indexed sources"
        );
        Ok(Self::new(mappers, java, config.render_options()))
    }

    pub fn new(mappers: MapperRegistry, java: JavaIndex, options: RenderOptions) -> Self {
        Self {
            mappers,
            java,
            options,
        }
    }

    pub fn previewer(&self) -> SqlPreviewer<'_> {
        SqlPreviewer::new(&self.mappers)
            .with_signatures(&self.java)
            .with_types(&self.java)
            .with_options(self.options)
    }

    /// Every statement in the project, sorted by dotted path.
    pub fn statements(&self) -> Vec<StatementPath> {
        let mut paths: Vec<StatementPath> = self
            .mappers
            .iter()
            .flat_map(|mapper| {
                mapper
                    .statements
                    .keys()
                    .map(|id| StatementPath::new(mapper.namespace.clone(), id.clone()))
            })
            .collect();
        paths.sort_by_key(|path| path.to_string());
        paths
    }

    pub fn report(&self) -> Report {
        Report::build(self)
    }
}

/// Renders every statement with its own parameter template. Fails if any of
/// them cannot be rendered.
pub fn check(config: &Config) -> Result<Report> {
    let report = Project::load(config)?.report();
    let failed = report.failures().count();
    if failed > 0 {
        return Err(ProjectError::CheckFailed {
            failed,
            total: report.len(),
        });
    }
    info!(statements = report.len(), "check passed");
    Ok(report)
}

/// Writes the preview report to the configured output file.
pub fn run(config: &Config) -> Result<Report> {
    let report = Project::load(config)?.report();
    report.write(&config.output.path, config.output.pretty)?;
    for (path, err) in report.failures() {
        error!(statement = path, "{}", err);
    }
    info!(
        statements = report.len(),
        output = %config.output.path.display(),
        "wrote report"
    );
    Ok(report)
}

pub fn watch(config: &Config) -> Result<()> {
    use console::style;
    use notify::{event::EventKind, event::ModifyKind, Config as NotifyConfig};
    use notify::{RecommendedWatcher, RecursiveMode, Watcher};

    println!("{}", style("batislens").green().bold());
    println!("  {} Initial preview...", style("➜").green());
    report_run(config);

    println!("  {} Watching for changes...", style("➜").cyan());
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, NotifyConfig::default())?;

    watcher.watch(&config.mappers.path, RecursiveMode::Recursive)?;
    for dir in &config.sources.paths {
        watcher.watch(dir, RecursiveMode::Recursive)?;
    }

    let output_path = config
        .output
        .path
        .canonicalize()
        .unwrap_or_else(|_| config.output.path.clone());
    let cwd = std::env::current_dir().ok();

    for res in rx {
        match res {
            Ok(event) => {
                if event.paths.contains(&output_path) {
                    continue;
                }
                if !matches!(event.kind, EventKind::Modify(ModifyKind::Data(_))) {
                    continue;
                }
                if !event.paths.iter().any(|path| is_watched_file(path)) {
                    continue;
                }

                if let Some(changed) = event.paths.first() {
                    let relative = cwd
                        .as_deref()
                        .and_then(|cwd| changed.strip_prefix(cwd).ok())
                        .unwrap_or(changed);
                    println!(
                        "\n{} Changed: {}",
                        style("[⚡️SQL]").yellow().bold(),
                        style(relative.display()).cyan()
                    );
                }
                report_run(config);
            }
            Err(e) => println!("  {} Watch error: {}", style("✖").red(), style(e).red()),
        }
    }

    Ok(())
}

fn report_run(config: &Config) {
    use console::style;

    match run(config) {
        Ok(report) => {
            let failed = report.failures().count();
            if failed == 0 {
                println!(
                    "  {} {} statements previewed",
                    style("➜").green(),
                    report.len()
                );
            } else {
                println!(
                    "  {} {} of {} statements failed",
                    style("✖").red(),
                    failed,
                    report.len()
                );
            }
        }
        Err(e) => println!("  {} Preview failed: {}", style("✖").red(), style(e).red()),
    }
}

fn is_watched_file(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "xml" || ext == "java")
}
