//! Get command.

use crate::cli::Context;
use crate::error::Result;

/// Print the resolved value of `key` on stdout.
pub fn execute(ctx: &Context, key: &str) -> Result<()> {
    let resolver = ctx.resolver()?;
    let value = resolver.resolve(key)?;
    println!("{}", value);
    Ok(())
}
