use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::configs::tasks::{GroupConfig, TaskConfig};
use crate::types::CaskerResult;

pub const CONFIG_FILE_NAME: &str = "casker.yml";

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaskerConfig {
    /// casker version this file was written for
    pub version: Option<String>,
    /// Directory appended to each task's search path, relative to its working directory
    pub bin_dir: Option<String>,
    /// Prefix applied to every task and group declared in this file
    pub namespace: Option<String>,
    /// Working directory for tasks, relative to this file
    pub cwd: Option<String>,
    pub tasks: Option<Vec<TaskConfig>>,
    pub groups: Option<Vec<GroupConfig>>,
    /// Additional task files loaded alongside this one
    pub modules: Option<Vec<ModuleConfig>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModuleConfig {
    /// Path to the module's task file, relative to the including file
    pub path: String,
    /// Overrides the namespace declared inside the module
    pub namespace: Option<String>,
}

pub fn parse_casker_config(yaml_str: &str) -> CaskerResult<CaskerConfig> {
    let config: CaskerConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::tasks::GroupMode;

    #[test]
    fn test_parse_full_config() {
        let config = parse_casker_config(
            r#"
version: "0.1.0"
binDir: .bin
tasks:
  - name: a
    command: echo A
    description: runs a
    env:
      KEY: value
  - name: serve
    command: ./server
    longRunning: true
    dependsOn: a
    onExit: a
groups:
  - name: a3
    mode: series
    tasks: [a, a, a]
  - name: both
    tasks: [a, serve]
modules:
  - path: web/casker.yml
    namespace: web
"#,
        )
        .unwrap();

        let tasks = config.tasks.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].env.as_ref().unwrap()["KEY"], "value");
        assert_eq!(tasks[1].long_running, Some(true));
        assert_eq!(tasks[1].depends_on.as_deref(), Some("a"));

        let groups = config.groups.unwrap();
        assert_eq!(groups[0].mode, GroupMode::Series);
        assert_eq!(groups[1].mode, GroupMode::Parallel);
        assert_eq!(config.modules.unwrap()[0].namespace.as_deref(), Some("web"));
        assert_eq!(config.bin_dir.as_deref(), Some(".bin"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = parse_casker_config("tasks:\n  - name: a\n    command: x\n    dependencies: [b]\n")
            .unwrap_err();
        assert!(err.to_string().contains("dependencies"));
    }

    #[test]
    fn test_empty_document() {
        let config = parse_casker_config("{}").unwrap();
        assert!(config.tasks.is_none());
    }
}
