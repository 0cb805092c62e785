//! Test fixtures and constants.

/// Secrets exported to the CLI process in local-mode tests.
pub const LOCAL_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "dev-key"),
];

/// Config file selecting remote mode.
pub const REMOTE_CONFIG: &str = r#"
[resolver]
environment = "prod"
secret_id = "my-app/prod"

[cache]
refresh_interval_secs = 120
max_cache_size = 16
"#;

/// Config file selecting local mode under a custom name.
pub const LOCAL_CONFIG: &str = r#"
[resolver]
environment = "local"
local_environment = "local"
"#;
