use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::time;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::model::Snapshot;
use crate::store::DocumentStore;

/// Port for the out-of-process extraction tool: read `source`, write a new
/// primary data file at `output`.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    async fn extract(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Adapter invoking the configured external command with
/// `<source> --output <output>` appended, judging success by exit status.
pub struct SubprocessExtractor {
    program: String,
    base_args: Vec<String>,
    timeout: Option<Duration>,
}

impl SubprocessExtractor {
    pub fn new(command_line: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| StoreError::Validation("extraction command is empty".to_string()))?;
        Ok(Self {
            program,
            base_args: parts.collect(),
            timeout,
        })
    }
}

#[async_trait]
impl ExtractionEngine for SubprocessExtractor {
    async fn extract(&self, source: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .arg(source)
            .arg("--output")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        info!(program = %self.program, source = %source.display(), "running extraction");
        let child = command.spawn()?;
        let result = match self.timeout {
            Some(limit) => match time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(StoreError::Extraction(format!(
                        "extraction timed out after {}s",
                        limit.as_secs()
                    )))
                }
            },
            None => child.wait_with_output().await?,
        };
        if result.status.success() {
            return Ok(());
        }
        let diagnostic = String::from_utf8_lossy(&result.stderr).trim().to_string();
        warn!(status = %result.status, "extraction process failed");
        Err(StoreError::Extraction(if diagnostic.is_empty() {
            "Extraction failed".to_string()
        } else {
            diagnostic
        }))
    }
}

/// Counts derived from the reloaded snapshot after a successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    #[serde(rename = "totalArticles")]
    pub total_articles: usize,
    pub categories: BTreeMap<String, usize>,
}

/// Hands saved uploads to the extraction engine and reconciles the document
/// store with whatever the tool wrote.
pub struct ExtractionBridge {
    engine: Arc<dyn ExtractionEngine>,
    store: Arc<DocumentStore>,
}

impl ExtractionBridge {
    pub fn new(engine: Arc<dyn ExtractionEngine>, store: Arc<DocumentStore>) -> Self {
        Self { engine, store }
    }

    pub async fn run(&self, source: &Path) -> Result<ExtractionSummary> {
        self.engine
            .extract(source, self.store.primary_path())
            .await?;
        let snapshot = self.store.load();
        let summary = summarize(&snapshot);
        info!(
            total_articles = summary.total_articles,
            "extraction finished, store reloaded"
        );
        Ok(summary)
    }
}

pub fn summarize(snapshot: &Snapshot) -> ExtractionSummary {
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for article in &snapshot.articles {
        let category = article
            .get("category")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or("Other");
        *categories.entry(category.to_string()).or_insert(0) += 1;
    }
    ExtractionSummary {
        total_articles: snapshot.articles.len(),
        categories,
    }
}
