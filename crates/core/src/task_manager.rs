//! High-level task management interface
//!
//! This module provides the [`TaskManager`], the primary interface for loading
//! a `casker.yml`, listing and planning its tasks, and running them.
//!
//! The TaskManager takes care of:
//! - Locating the configuration file and the module files it includes
//! - Registering every task and group under its namespaced name
//! - Planning dependency stages and running them with teardown
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use casker_core::reporting::ConsoleReporter;
//! use casker_core::task_manager::{TaskManager, TaskManagerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> casker_core::types::CaskerResult<()> {
//! let manager = TaskManager::new(TaskManagerConfig::discover(".".into()))?;
//!
//! let plan = manager.get_execution_plan("build")?;
//! println!("{:?}", plan.stages);
//!
//! manager
//!     .run_task("build", Arc::new(ConsoleReporter), CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::builder::{qualify, TaskBuilder};
use crate::configs::project::{parse_casker_config, CaskerConfig, CONFIG_FILE_NAME};
use crate::configs::tasks::GroupMode;
use crate::execution::runner::{TaskRunner, TaskRunnerConfig};
use crate::execution::stages::{plan_stages, stage_names};
use crate::registry::Registry;
use crate::reporting::TaskReporter;
use crate::results::{ExecutionPlanResult, TaskInfo, TaskListResult};
use crate::tasks::{NodeRef, TaskOptions};
use crate::types::{CaskerError, CaskerResult};

/// Configuration for initializing a task manager
#[derive(Debug, Clone)]
pub struct TaskManagerConfig {
    /// Explicit configuration file; skips discovery when set
    pub config_path: Option<PathBuf>,
    /// Directory discovery starts from
    pub start_dir: PathBuf,
}

impl TaskManagerConfig {
    pub fn discover(start_dir: PathBuf) -> Self {
        Self {
            config_path: None,
            start_dir,
        }
    }
}

/// High-level manager that owns the loaded registry
pub struct TaskManager {
    pub registry: Registry,
    pub config: CaskerConfig,
    pub config_path: PathBuf,
    pub runner_config: TaskRunnerConfig,
}

/// One task file with the namespace and directory its tasks run under
struct LoadedModule {
    namespace: String,
    cwd: PathBuf,
    config: CaskerConfig,
}

impl TaskManager {
    /// Locate, parse and register the configuration
    pub fn new(config: TaskManagerConfig) -> CaskerResult<Self> {
        let config_path = match config.config_path {
            Some(path) if path.is_file() => path,
            Some(path) => return Err(CaskerError::ConfigNotFound { start: path }),
            None => Self::locate_config(&config.start_dir)?,
        };

        let root_config = Self::load_config(&config_path)?;
        let modules = Self::load_modules(&config_path, &root_config)?;

        let mut registry = Registry::new();
        Self::register_modules(&mut registry, &modules)?;
        registry.validate()?;

        let mut runner_config = TaskRunnerConfig::default();
        if let Some(bin_dir) = &root_config.bin_dir {
            runner_config.local_bin_dir = PathBuf::from(bin_dir);
        }

        tracing::debug!(
            config = %config_path.display(),
            tasks = registry.len(),
            "loaded task configuration"
        );

        Ok(Self {
            registry,
            config: root_config,
            config_path,
            runner_config,
        })
    }

    /// List all registered tasks and groups
    pub fn list_tasks(&self) -> TaskListResult {
        TaskListResult {
            tasks: self.registry.iter().map(TaskInfo::from).collect(),
        }
    }

    /// Get the stage plan for a task without running it
    pub fn get_execution_plan(&self, task_name: &str) -> CaskerResult<ExecutionPlanResult> {
        let root = self.registry.resolve(task_name)?;
        let stages = plan_stages(&self.registry, root)?;

        Ok(ExecutionPlanResult {
            task_name: task_name.to_string(),
            stages: stage_names(&stages),
        })
    }

    /// Run a task with its dependencies, then tear down every remaining process
    pub async fn run_task(
        &self,
        task_name: &str,
        reporter: Arc<dyn TaskReporter>,
        shutdown: CancellationToken,
    ) -> CaskerResult<()> {
        let root = self.registry.resolve(task_name)?;
        let runner = TaskRunner::new(&self.registry, reporter).with_config(self.runner_config.clone());
        runner.run_with_teardown(root, shutdown).await
    }

    /// Message describing a mismatch between the declared and running versions
    pub fn version_mismatch(&self) -> Option<String> {
        let declared = self.config.version.as_deref()?;
        let running = env!("CARGO_PKG_VERSION");
        (declared != running).then(|| {
            format!(
                "casker version {} is different from the version {} declared in {}.",
                running,
                declared,
                self.config_path.display()
            )
        })
    }

    // Private helper methods

    fn locate_config(start_dir: &Path) -> CaskerResult<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| CaskerError::ConfigNotFound {
                start: start_dir.to_path_buf(),
            })
    }

    fn load_config(path: &Path) -> CaskerResult<CaskerConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CaskerError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        parse_casker_config(&content).map_err(|e| {
            CaskerError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn load_modules(config_path: &Path, root: &CaskerConfig) -> CaskerResult<Vec<LoadedModule>> {
        let root_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut modules = vec![LoadedModule {
            namespace: root.namespace.clone().unwrap_or_default(),
            cwd: root_dir.join(root.cwd.as_deref().unwrap_or(".")),
            config: root.clone(),
        }];

        for module in root.modules.iter().flatten() {
            let path = root_dir.join(&module.path);
            if !path.is_file() {
                return Err(CaskerError::ModuleNotInstalled { path });
            }

            let config = Self::load_config(&path)?;
            if config.modules.as_ref().is_some_and(|nested| !nested.is_empty()) {
                return Err(CaskerError::Config(format!(
                    "Module {} includes further modules; only the root config may include modules",
                    path.display()
                )));
            }

            let module_dir = path.parent().unwrap_or(root_dir);
            modules.push(LoadedModule {
                namespace: module
                    .namespace
                    .clone()
                    .or_else(|| config.namespace.clone())
                    .unwrap_or_default(),
                cwd: module_dir.join(config.cwd.as_deref().unwrap_or(".")),
                config,
            });
        }

        Ok(modules)
    }

    fn register_modules(registry: &mut Registry, modules: &[LoadedModule]) -> CaskerResult<()> {
        // Every qualified name any file declares, so local references can be
        // told apart from references into other modules.
        let declared: HashSet<String> = modules
            .iter()
            .flat_map(|module| {
                let tasks = module.config.tasks.iter().flatten().map(|t| t.name.as_str());
                let groups = module.config.groups.iter().flatten().map(|g| g.name.as_str());
                tasks
                    .chain(groups)
                    .map(|name| qualify(&module.namespace, name))
                    .collect::<Vec<_>>()
            })
            .collect();

        for module in modules {
            let resolve = |raw: &str| {
                let local = qualify(&module.namespace, raw);
                if declared.contains(&local) {
                    NodeRef::new(local)
                } else {
                    NodeRef::new(raw)
                }
            };

            let mut builder = TaskBuilder::new(registry, module.namespace.as_str(), module.cwd.clone());

            for task in module.config.tasks.iter().flatten() {
                let options = TaskOptions {
                    env: task.env.clone().unwrap_or_default(),
                    is_long_running: task.long_running.unwrap_or(false),
                    description: task.description.clone().unwrap_or_default(),
                    dependency: task.depends_on.as_deref().map(resolve),
                    on_exit: task.on_exit.as_deref().map(resolve),
                };
                builder.task(&task.name, &task.command, options)?;
            }

            for group in module.config.groups.iter().flatten() {
                let members: Vec<NodeRef> = group.tasks.iter().map(|name| resolve(name)).collect();
                builder.group(
                    &group.name,
                    group.description.as_deref().unwrap_or_default(),
                    &members,
                    group.mode == GroupMode::Parallel,
                )?;
            }
        }

        Ok(())
    }
}
