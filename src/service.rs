//! The skill operations exposed to transports.
//!
//! [`SkillService`] owns a shared, read-only registry and an optional usage
//! logger; every method can be called from any number of threads at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SkillzError};
use crate::manifest::SkillMetadata;
use crate::registry::{SkillRegistry, SkillSummary};
use crate::resource::{self, ResourceContent, ResourceEntry, ResourceMiss};
use crate::sandbox::{self, ExecutionResult, RunRequest};
use crate::usage::UsageLogger;

/// Guidance attached to every invocation.
pub const USAGE_GUIDANCE: &str = "Follow the instructions above to complete the task. \
Read supporting files with fetch_resource using the listed resource URIs. \
Run bundled scripts with run_script, passing the skill slug and the script path \
relative to the skill root.";

/// Upper bound on response length requested from a [`Sampler`].
pub const SUMMARY_MAX_TOKENS: u32 = 512;

/// External text-generation capability used by [`SkillService::summarize`].
pub trait Sampler {
    fn sample(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Everything an agent needs to carry out a task with one skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillInvocation {
    pub skill: String,
    pub task: String,
    pub metadata: SkillMetadata,
    pub resources: Vec<ResourceEntry>,
    pub instructions: String,
    pub usage: &'static str,
}

#[derive(Debug, Clone)]
pub struct SkillService {
    registry: Arc<SkillRegistry>,
    usage: Option<Arc<UsageLogger>>,
    default_timeout: Duration,
}

impl SkillService {
    #[must_use]
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self {
            registry,
            usage: None,
            default_timeout: sandbox::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_usage_logger(mut self, logger: Arc<UsageLogger>) -> Self {
        self.usage = Some(logger);
        self
    }

    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    #[must_use]
    pub fn list_skills(&self) -> Vec<SkillSummary> {
        self.registry.skills().iter().map(|skill| skill.summary()).collect()
    }

    pub fn get_skill_metadata(&self, slug: &str) -> Result<SkillSummary> {
        let skill = self.registry.get(slug)?;
        if let Some(usage) = &self.usage {
            usage.skill_read(skill.slug(), "metadata", None);
        }
        Ok(skill.summary())
    }

    /// Bundle the instructions and resource listing for `task`.
    pub fn invoke_skill(&self, slug: &str, task: &str) -> Result<SkillInvocation> {
        let task = task.trim();
        if task.is_empty() {
            return Err(SkillzError::Validation(
                "A task description is required to invoke a skill.".to_string(),
            ));
        }
        let started = Instant::now();
        let skill = self.registry.get(slug)?;

        let session = self.usage.as_ref().map(|usage| {
            let metadata = serde_json::json!({
                "name": skill.name(),
                "resource_count": skill.resources().len(),
            });
            usage.skill_invoked(skill.slug(), task, Some(metadata))
        });

        let invocation = SkillInvocation {
            skill: skill.slug().to_string(),
            task: task.to_string(),
            metadata: skill.metadata().clone(),
            resources: resource::entries(skill),
            instructions: skill.body().to_string(),
            usage: USAGE_GUIDANCE,
        };

        if let (Some(usage), Some(session)) = (&self.usage, session) {
            usage.skill_read(skill.slug(), "instructions", Some(&session));
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            usage.skill_complete(&session, skill.slug(), "success", Some(elapsed), None);
        }
        Ok(invocation)
    }

    /// Read a resource; misses are values, not faults.
    pub fn read_resource(&self, uri: &str) -> std::result::Result<ResourceContent, ResourceMiss> {
        let result = resource::read_resource(&self.registry, uri);
        match &result {
            Ok(content) => {
                if let (Some(usage), Ok(address)) = (&self.usage, resource::resolve_uri(uri)) {
                    usage.resource_fetched(&address.slug, &content.uri, None);
                }
            }
            Err(miss) => debug!(uri, code = miss.code(), "Resource miss"),
        }
        result
    }

    /// Run a bundled script; `timeout` falls back to the service default.
    pub fn run_script(
        &self,
        slug: &str,
        path: &str,
        request: &RunRequest,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult> {
        let skill = self.registry.get(slug)?;
        let result = sandbox::run_script(skill, path, request, timeout.unwrap_or(self.default_timeout))?;
        if let Some(usage) = &self.usage {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let duration_ms = (result.duration_seconds * 1000.0).round() as u64;
            usage.script_executed(skill.slug(), path, result.exit_code, duration_ms);
        }
        Ok(result)
    }

    /// Ask `sampler` to summarize the skill's instructions, or one text resource.
    pub fn summarize(&self, slug: &str, resource_path: Option<&str>, sampler: &dyn Sampler) -> Result<String> {
        let skill = self.registry.get(slug)?;
        let (label, text) = match resource_path {
            None => ("instructions".to_string(), skill.body().to_string()),
            Some(rel) => {
                let uri = resource::build_uri(skill.slug(), rel);
                let content = resource::read_resource(&self.registry, &uri)?;
                let bytes = content.payload.decode()?;
                let text = String::from_utf8(bytes).map_err(|_| {
                    SkillzError::Validation(format!("Resource '{rel}' is not text and cannot be summarized."))
                })?;
                (format!("resource '{rel}'"), text)
            }
        };
        let prompt = format!(
            "Summarize the {label} of the skill \"{}\" ({}) for an agent deciding whether to use it.\n\n{text}",
            skill.name(),
            skill.metadata().description,
        );
        sampler.sample(&prompt, SUMMARY_MAX_TOKENS)
    }
}
