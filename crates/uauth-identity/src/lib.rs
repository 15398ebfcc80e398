//! # uauth-identity: Identity Context
//!
//! Ties the workspace together for callers: read [`AuthConfig`], build one
//! [`IdentityContext`], and pass it wherever an identity is needed.
//!
//! ```no_run
//! # async fn demo() -> Result<(), uauth_identity::ContextError> {
//! use uauth_identity::{AuthConfig, IdentityContext};
//!
//! let ctx = IdentityContext::from_config(&AuthConfig::from_env()?)?;
//! let identity = ctx.identity().await?;
//! let token = ctx.issue_token("example.com").await?;
//! assert!(ctx.verify_token(&token).is_valid());
//! # let _ = identity;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;

pub use config::{AuthConfig, ConfigError};
pub use context::IdentityContext;
pub use error::ContextError;
