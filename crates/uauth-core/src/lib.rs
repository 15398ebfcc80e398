//! # uauth-core: Foundational Types for Universal Auth
//!
//! This crate is the leaf of the universal-auth workspace. It defines the
//! primitives every other crate relies on to agree, byte for byte, on what
//! was signed and who signed it.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every token payload that is signed or
//!    verified flows through `CanonicalBytes::new()`. Issuer and verifier
//!    cannot disagree on key order or whitespace.
//!
//! 2. **`UserId` is derived, never assigned.** The only constructor that
//!    does not validate is `derive_user_id()`, a pure function of the public
//!    key. Every component that recomputes an identifier gets the same one.
//!
//! 3. **Injectable time.** Expiry decisions read a `Clock`, not the system
//!    time directly, so tests can pin "now" and callers can reason about skew.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `uauth-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CryptoError};
pub use identity::{derive_user_id, UserId, USER_ID_BITS, USER_ID_HEX_LEN};
pub use temporal::{Clock, EpochMillis, ManualClock, SystemClock};
