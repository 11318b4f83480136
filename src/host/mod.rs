//! Host runtime capabilities.
//!
//! The engine never touches raw `Cookie`/`Set-Cookie` headers or the process
//! environment directly. It talks to the host through the traits here, so the
//! same decision logic runs behind the gateway server and against in-memory
//! fakes in tests.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → cookies.rs (RequestCookies parses Cookie header)
//!     → engine reads/sets/deletes through CookieJar
//!     → RequestCookies renders pending Set-Cookie headers onto the response
//!
//! Startup:
//!     env.rs (Environment::get) → secret, bypass password
//! ```

pub mod context;
pub mod cookies;
pub mod env;

pub use context::DeploymentContext;
pub use cookies::{CookieDescriptor, CookieJar, MemoryCookieJar, RequestCookies, SameSite};
pub use env::{Environment, ProcessEnvironment};
