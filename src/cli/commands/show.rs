//! skillz show - Show skill details

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::Result;

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Skill slug
    pub slug: String,

    /// Task to invoke the skill for; prints its instructions and resources
    #[arg(long)]
    pub task: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    if let Some(task) = &args.task {
        let invocation = ctx.service.invoke_skill(&args.slug, task)?;
        if ctx.output.is_json() {
            return emit_json(&invocation);
        }
        println!("{}", invocation.metadata.name.bold());
        println!("{}: {}", "Task".dimmed(), invocation.task);
        println!();
        println!("{}", invocation.instructions.trim_end());
        if !invocation.resources.is_empty() {
            println!();
            println!("{}", "Resources".bold());
            for resource in &invocation.resources {
                println!("  {}", resource.uri);
            }
        }
        println!();
        println!("{}", invocation.usage.dimmed());
        return Ok(());
    }

    let summary = ctx.service.get_skill_metadata(&args.slug)?;
    if ctx.output.is_json() {
        return emit_json(&summary);
    }

    println!("{}", summary.name.bold());
    println!("{}", "═".repeat(summary.name.chars().count()));
    println!("{}: {}", "Slug".dimmed(), summary.slug);
    println!("{}: {}", "Description".dimmed(), summary.description);
    if let Some(license) = &summary.license {
        println!("{}: {license}", "License".dimmed());
    }
    if !summary.allowed_tools.is_empty() {
        println!("{}: {}", "Allowed tools".dimmed(), summary.allowed_tools.join(", "));
    }
    println!("{}: {} ({})", "Source".dimmed(), summary.locator, summary.kind);
    for (key, value) in &summary.extra {
        println!("{}: {value}", key.dimmed());
    }
    if !summary.resource_uris.is_empty() {
        println!();
        println!("{}", "Resources".bold());
        for uri in &summary.resource_uris {
            println!("  {uri}");
        }
    }
    Ok(())
}
