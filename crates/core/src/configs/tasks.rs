use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    /// Shell command, run with `sh -c` (or `cmd /d /s /c` on Windows)
    pub command: String,
    pub description: Option<String>,
    /// Variables for the task; the ambient environment takes precedence
    pub env: Option<BTreeMap<String, String>>,
    /// Treat the task as done as soon as it has been spawned
    pub long_running: Option<bool>,
    /// Task or group that must complete first
    pub depends_on: Option<String>,
    /// Task or group run after this task settles
    pub on_exit: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Parallel,
    Series,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub mode: GroupMode,
    /// Member task names; groups cannot contain groups
    pub tasks: Vec<String>,
}
