//! Status command.
//!
//! Reports which source the current settings select without touching it, so
//! it works even when the remote store is unreachable.

use crate::cli::{output, Context};
use crate::error::Result;

/// Show the active environment and resolution mode.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let settings = ctx.settings()?;
    let mode = if settings.is_local() { "local" } else { "remote" };
    let cache = settings.cache.clone().unwrap_or_default();
    let secret_id = if settings.is_local() {
        None
    } else {
        settings.secret_id.as_deref()
    };

    if json {
        let report = serde_json::json!({
            "environment": settings.environment,
            "local_environment": settings.local_environment,
            "mode": mode,
            "secret_id": secret_id,
            "cache": {
                "max_cache_size": cache.max_cache_size,
                "refresh_interval_secs": cache.refresh_interval.as_secs(),
                "version_stage": cache.version_stage,
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("envsecrets");
    output::kv("environment:", &settings.environment);
    output::kv("local env:  ", &settings.local_environment);
    output::kv("mode:       ", mode);

    if !settings.is_local() {
        output::kv("secret id:  ", secret_id.unwrap_or("(not set)"));
        output::kv("refresh:    ", format!("{}s", cache.refresh_interval.as_secs()));
        output::kv("cache size: ", cache.max_cache_size);
        output::kv("stage:      ", &cache.version_stage);
    }

    Ok(())
}
