//! Identity resolution primitives for the gatehouse authentication gateway.
//!
//! This crate provides:
//! - The static provider catalog (`Provider`) and scope handling
//! - Session state (`SessionData`, `SessionHandle`) and the `SessionStore` seam
//! - The `UserDirectory` seam for resolving provider subjects and bearer
//!   tokens to local users
//! - The `Handshake` capability consumed by the web layer to drive the
//!   redirect-based provider exchange
//! - `FauxHandshake` and `MemoryDirectory`, in-process implementations used
//!   by tests and local development
//!
//! # Identity Model
//!
//! A request's identity (`Principal`) is derived once, with fixed precedence:
//! an explicit bearer token outranks the ambient session, which outranks an
//! inline-completed provider assertion. The web layer constructs the
//! principal; this crate owns the types and the collaborator seams.
//!
//! # Example
//!
//! ```
//! use gatehouse_access::provider::Provider;
//!
//! let google = Provider::from_slug("google").expect("catalog entry");
//! assert_eq!(google.label(), "Google");
//! assert!(!google.requires_source());
//!
//! // Catalog order is stable and slug-sorted.
//! let slugs: Vec<_> = Provider::catalog().iter().map(|p| p.slug()).collect();
//! let mut sorted = slugs.clone();
//! sorted.sort_unstable();
//! assert_eq!(slugs, sorted);
//! ```

pub mod directory;
pub mod error;
pub mod faux;
pub mod handshake;
pub mod principal;
pub mod provider;
pub mod session;

// Re-export main types at crate root
pub use directory::{MemoryDirectory, UserDirectory, UserRecord};
pub use error::{ActivationError, DirectoryError, HandshakeError, SessionError};
pub use faux::FauxHandshake;
pub use handshake::{CallbackParams, Handshake, ProviderIdentity, ProviderRegistration};
pub use principal::{Principal, PrincipalSource};
pub use provider::Provider;
pub use session::{MemoryStore, PendingFlow, SessionData, SessionHandle, SessionStore};
