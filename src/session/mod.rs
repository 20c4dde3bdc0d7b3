//! Session hardening subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → cookie.rs (find and verify the signed session cookie)
//!     → gate.rs (public bypass, session, auth entry, bearer, reject)
//!     → handlers (SessionContext in extensions)
//!     → cookie.rs (rolling re-issue on the way out)
//! ```
//!
//! # Design Decisions
//! - Cookie flags are fixed at startup; only `Secure` depends on the environment
//! - A bearer header is checked for presence, never validity
//! - Tampered cookies are treated as absent, not as errors

pub mod cookie;
pub mod gate;

pub use cookie::{SameSite, SessionContext, SessionCookieConfig};
pub use gate::{session_middleware, SessionDecision, SessionGate};
