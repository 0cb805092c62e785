//! envsecrets - Environment-aware secret resolution.
//!
//! Reads configuration values from process environment variables when running
//! in the local environment, and from a JSON secret blob in a managed secret
//! store (behind an in-process cache) everywhere else.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── get           # Print a resolved value
//! │   ├── status        # Show environment and mode
//! │   ├── check         # Verify keys resolve
//! │   └── completions   # Shell completions
//! └── core/             # Library components
//!     ├── config        # Settings and cache options
//!     ├── resolver      # Local / remote resolution
//!     ├── cache         # Caching client (refresh, backoff, LRU)
//!     └── source/       # Store abstractions
//!         ├── mod       # SecretSource and SecretFetcher traits
//!         └── aws       # AWS Secrets Manager fetcher
//! ```
//!
//! # Example
//!
//! ```no_run
//! use envsecrets::{Resolver, Settings};
//!
//! let settings = Settings::new("prod").with_secret_id("my-app/prod");
//! let resolver = Resolver::new(settings)?;
//! let url = resolver.resolve("DATABASE_URL")?;
//! # Ok::<(), envsecrets::error::Error>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::cache::{CacheInfo, SecretCache};
pub use crate::core::config::{CacheConfig, Settings};
pub use crate::core::resolver::Resolver;
pub use crate::core::source::{SecretFetcher, SecretSource};
