//! Check command.
//!
//! Resolves every listed key and reports the ones that fail. Values are never
//! printed.

use crate::cli::{output, Context};
use crate::error::{Error, Result};

/// Verify that every key in `keys` resolves.
pub fn execute(ctx: &Context, keys: &[String]) -> Result<()> {
    let resolver = ctx.resolver()?;
    let mut failed = 0;

    for key in keys {
        match resolver.resolve(key) {
            Ok(_) => output::success(&output::key(key)),
            Err(e) => {
                failed += 1;
                output::error(&format!("{}: {}", output::key(key), e));
            }
        }
    }

    if failed > 0 {
        return Err(Error::CheckFailed {
            failed,
            total: keys.len(),
        });
    }
    Ok(())
}
