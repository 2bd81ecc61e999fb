//! The backend configuration served over `/bootstrap/config` (spec.md
//! §4.4), derived from the CLI options the frontend parsed.

use serde::{Deserialize, Serialize};

/// One compiler stage's debug-posting behaviour: whether the backend
/// should announce `start`/`done` for it over the IPC channel at all.
/// Every stage the pipeline runs gets an entry; `debug` is `true` exactly
/// when `--trace` named that stage (or `--trace` with no value, which
/// enables every stage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(default)]
    pub debug: bool,
}

/// The JSON body a backend worker receives from `GET /bootstrap/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub keep_assembly: bool,
    #[serde(default)]
    pub list_ir: bool,
}

const PIPELINE_STAGES: [&str; 5] = ["lex", "parse", "bind", "lower", "codegen"];

impl BackendConfig {
    /// Builds the config a `Cli` invocation implies: every pipeline stage
    /// traced if `trace` named it (or is `Some("true")`/unnamed), none
    /// traced if `trace` is absent.
    pub fn from_trace_spec(trace: Option<&str>, keep_assembly: bool, list_ir: bool) -> Self {
        let stages = PIPELINE_STAGES
            .iter()
            .map(|&name| StageConfig { name: name.to_string(), debug: stage_is_traced(trace, name) })
            .collect();
        BackendConfig { stages, keep_assembly, list_ir }
    }

    pub fn stage_is_debugged(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name && s.debug)
    }
}

fn stage_is_traced(trace: Option<&str>, stage: &str) -> bool {
    match trace {
        None => false,
        Some("true") => true,
        Some(categories) => categories.split(';').any(|c| c == stage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trace_flag_debugs_nothing() {
        let config = BackendConfig::from_trace_spec(None, false, false);
        assert!(!config.stage_is_debugged("lex"));
    }

    #[test]
    fn bare_trace_flag_debugs_every_stage() {
        let config = BackendConfig::from_trace_spec(Some("true"), false, false);
        assert!(config.stage_is_debugged("lex"));
        assert!(config.stage_is_debugged("codegen"));
    }

    #[test]
    fn named_categories_debug_only_those_stages() {
        let config = BackendConfig::from_trace_spec(Some("bind;codegen"), false, false);
        assert!(config.stage_is_debugged("bind"));
        assert!(config.stage_is_debugged("codegen"));
        assert!(!config.stage_is_debugged("lex"));
    }

    #[test]
    fn round_trips_through_json() {
        let config = BackendConfig::from_trace_spec(Some("lex"), true, true);
        let json = serde_json::to_value(&config).unwrap();
        let back: BackendConfig = serde_json::from_value(json).unwrap();
        assert!(back.keep_assembly);
        assert!(back.stage_is_debugged("lex"));
    }
}
