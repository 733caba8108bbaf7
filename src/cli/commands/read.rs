//! skillz read - Read a resource by URI

use std::io::Write;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::encoding::Encoding;
use crate::error::Result;

#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Resource URI (resource://skillz/<slug>/<path>)
    pub uri: String,
}

pub fn run(ctx: &AppContext, args: &ReadArgs) -> Result<()> {
    let content = ctx.service.read_resource(&args.uri)?;
    if ctx.output.is_json() {
        return emit_json(&content);
    }
    match content.payload.encoding {
        Encoding::Text => print!("{}", content.payload.content),
        Encoding::Base64 => {
            let bytes = content.payload.decode()?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
