//! Platform details for spawning task commands

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Shell and search-path conventions of the current platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Program used to interpret task commands
    pub shell: String,
    /// Arguments placed before the command string
    pub shell_args: Vec<String>,
    /// Name of the search-path environment variable
    pub path_var: String,
    /// Separator between search-path entries
    pub path_delimiter: char,
}

impl PlatformInfo {
    /// Detect the current platform from the ambient environment
    pub fn current() -> Self {
        let vars: Vec<(String, String)> = env::vars().collect();
        Self::from_os(env::consts::OS, &vars)
    }

    /// Build platform info from an OS name and a snapshot of the environment
    pub fn from_os(os: &str, vars: &[(String, String)]) -> Self {
        if os == "windows" {
            let shell = vars
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("comspec"))
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| "cmd".to_string());
            // Windows usually spells it "Path", but any casing is possible.
            let path_var = vars
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("path"))
                .map(|(key, _)| key.clone())
                .unwrap_or_else(|| "Path".to_string());

            Self {
                shell,
                shell_args: vec!["/d".into(), "/s".into(), "/c".into()],
                path_var,
                path_delimiter: ';',
            }
        } else {
            Self {
                shell: "sh".to_string(),
                shell_args: vec!["-c".into()],
                path_var: "PATH".to_string(),
                path_delimiter: ':',
            }
        }
    }

    /// Assemble a task's environment: overrides first, then the ambient
    /// environment on top, then the recomputed search path.
    pub fn build_environment(
        &self,
        overrides: &BTreeMap<String, String>,
        ambient: &[(String, String)],
        working_directory: &Path,
        local_bin_dir: &Path,
    ) -> BTreeMap<String, String> {
        let mut env = overrides.clone();
        let ambient_path = ambient
            .iter()
            .find(|(key, _)| *key == self.path_var)
            .map(|(_, value)| value.clone());

        env.extend(ambient.iter().cloned());

        let local_bin = working_directory.join(local_bin_dir);
        let local_bin = local_bin.to_string_lossy();
        let entries = [
            overrides.get(&self.path_var).map(String::as_str),
            ambient_path.as_deref(),
            Some(&*local_bin),
        ];

        let search_path = entries
            .into_iter()
            .flatten()
            .filter(|entry| !entry.is_empty())
            .collect::<Vec<_>>()
            .join(&self.path_delimiter.to_string());

        env.insert(self.path_var.clone(), search_path);
        env
    }
}
