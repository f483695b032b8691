use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, error};

use crate::error::Result;
use crate::Project;

/// The preview of one statement rendered with its own parameter template.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportEntry {
    pub parameters: Json,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every statement of a project keyed by `namespace.id`.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Report {
    pub entries: BTreeMap<String, ReportEntry>,
}

impl Report {
    pub fn build(project: &Project) -> Self {
        let previewer = project.previewer();
        let mut entries = BTreeMap::new();

        for path in project.statements() {
            let entry = match previewer.generate_parameter_template(&path) {
                Ok(parameters) => match previewer.generate_sql_from_value(&path, &parameters) {
                    Ok(sql) => ReportEntry {
                        parameters,
                        sql: Some(sql),
                        error: None,
                    },
                    Err(err) => {
                        error!(statement = %path, "{}", err);
                        ReportEntry {
                            parameters,
                            sql: None,
                            error: Some(err.report()),
                        }
                    }
                },
                Err(err) => {
                    error!(statement = %path, "{}", err);
                    ReportEntry {
                        parameters: Json::Null,
                        sql: None,
                        error: Some(err.report()),
                    }
                }
            };
            debug!(statement = %path, ok = entry.error.is_none(), "previewed");
            entries.insert(path.to_string(), entry);
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statements that failed to render, with their error reports.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(path, entry)| entry.error.as_deref().map(|err| (path.as_str(), err)))
    }

    pub fn write(&self, path: &Path, pretty: bool) -> Result<()> {
        let content = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}
