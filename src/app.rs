use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cli::{Cli, OutputFormat};
use crate::config::{self, Config};
use crate::error::{Result, SkillzError};
use crate::registry::SkillRegistry;
use crate::sandbox::timeout_from_secs;
use crate::service::SkillService;
use crate::usage::UsageLogger;

/// Everything a command needs, built once from the parsed CLI.
pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub service: SkillService,
    pub output: OutputFormat,
    pub verbose: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = config::resolve_skills_root(cli.root.as_deref());
        let mut config = Config::load(cli.config.as_deref(), &root)?;
        if let Some(seconds) = cli.timeout {
            config.execution.timeout_secs = seconds;
        }
        let timeout = timeout_from_secs(config.execution.timeout_secs)
            .map_err(|err| SkillzError::Config(err.to_string()))?;

        let registry = Arc::new(SkillRegistry::load(&root)?);
        let mut service = SkillService::new(Arc::clone(&registry)).with_default_timeout(timeout);
        if config.logging.enabled {
            let logger = UsageLogger::new(config.logging.clone(), Some(registry.root()));
            service = service.with_usage_logger(Arc::new(logger));
        }
        debug!(root = %root.display(), skills = registry.len(), "Application context ready");

        Ok(Self {
            root,
            config,
            service,
            output: cli.output,
            verbose: cli.verbose,
        })
    }
}
