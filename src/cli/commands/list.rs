//! skillz list - List discovered skills

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::Result;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Also show candidates that were skipped during discovery
    #[arg(long)]
    pub skipped: bool,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let skills = ctx.service.list_skills();
    let report = ctx.service.registry().report();

    if ctx.output.is_json() {
        if args.skipped {
            return emit_json(&serde_json::json!({
                "skills": skills,
                "skipped": report.skipped,
            }));
        }
        return emit_json(&skills);
    }

    if skills.is_empty() {
        println!("No valid skills discovered.");
    }
    for skill in &skills {
        println!("- {} (slug: {}) -> {}", skill.name, skill.slug, skill.locator);
    }

    if args.skipped || ctx.verbose > 0 {
        for skipped in &report.skipped {
            println!(
                "{} {} ({})",
                "skipped".yellow(),
                skipped.path.display(),
                skipped.reason.to_string().dimmed()
            );
        }
    }
    Ok(())
}
