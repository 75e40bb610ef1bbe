//! Workflow configuration (YAML).

use std::path::{Path, PathBuf};

use dn_graph::AggregationPolicy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::format::RecordFormat;
use crate::{RecordResult, read_file};

/// Settings shared by every command of a workflow.
///
/// ```yaml
/// format:
///   delimiter: ","
///   outlet_token: ""
///   has_header: true
/// aggregation:
///   default: downstream
///   attributes:
///     area: sum
///     elevation: downstream
/// gauges: data/gauges.txt
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub format: RecordFormat,
    pub aggregation: AggregationPolicy,
    /// Stream-gauge dictionary file, relative to the config file.
    pub gauges: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> RecordResult<WorkflowConfig> {
    let content = read_file(path)?;
    let mut config: WorkflowConfig = serde_yaml::from_str(&content)?;
    if let (Some(gauges), Some(dir)) = (config.gauges.as_ref(), path.parent()) {
        if gauges.is_relative() {
            config.gauges = Some(dir.join(gauges));
        }
    }
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}
