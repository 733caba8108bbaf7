//! skillz run - Run a skill script

use std::io::Write;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::encoding::EncodedContent;
use crate::error::{Result, SkillzError};
use crate::sandbox::RunRequest;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Skill slug
    pub slug: String,

    /// Script path relative to the skill root
    pub path: String,

    /// Text passed on the script's stdin
    #[arg(long)]
    pub stdin: Option<String>,

    /// Extra environment variable (KEY=VALUE), repeatable
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Working directory relative to the skill root
    #[arg(long)]
    pub workdir: Option<String>,

    /// Arguments passed to the script
    #[arg(last = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn parse_env_pair(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let mut request = RunRequest::new().args(args.args.iter().cloned());
    if let Some(stdin) = &args.stdin {
        request = request.stdin(EncodedContent::text(stdin.clone()));
    }
    for (key, value) in &args.env {
        request = request.env(key.clone(), value.clone());
    }
    if let Some(workdir) = &args.workdir {
        request = request.workdir(workdir.clone());
    }

    let result = ctx.service.run_script(&args.slug, &args.path, &request, None)?;

    if ctx.output.is_json() {
        emit_json(&result)?;
    } else {
        std::io::stdout().write_all(&result.stdout.decode()?)?;
        std::io::stderr().write_all(&result.stderr.decode()?)?;
    }

    match result.exit_code {
        Some(0) => Ok(()),
        Some(code) => Err(SkillzError::Execution(format!(
            "Script {} exited with status {code}.",
            args.path
        ))),
        None => Err(SkillzError::Execution(format!(
            "Script {} was terminated by a signal.",
            args.path
        ))),
    }
}
