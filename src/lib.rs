//! kukaya-shell - offline app shell and API client for the Kukaya app.
//!
//! This library provides the client-side plumbing of the Kukaya booking
//! app: a shell worker that keeps one versioned generation of app-shell
//! assets cached (serving them stale-while-revalidate with an offline
//! fallback), and thin HTTP helpers for the OTP-authenticated backend API.
//!
//! # Example
//!
//! ```no_run
//! use kukaya_shell::{Request, ShellConfig, ShellWorker};
//!
//! # async fn example() -> kukaya_shell::Result<()> {
//! let config = ShellConfig::new()
//!     .with_api_base_url("https://kukaya.app/")
//!     .with_cache_version(2);
//!
//! // Install the app shell and take over from older generations.
//! let worker = ShellWorker::new(config)?;
//! worker.install().await?;
//!
//! // Route an intercepted request: cached copy now, refresh later.
//! let response = worker.handle_request(Request::navigation("/")).await?;
//! println!("served {} bytes", response.body.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod notify;
pub mod shell;
pub mod store;

// Re-export main types for convenience
pub use api::{ApiClient, OtpChallenge, Session, User};
pub use config::ShellConfig;
pub use error::{Error, Result};
pub use fetch::{Fetcher, ReqwestFetcher};
pub use http::{Method, Request, RequestMode, Response, ResponseKind};
pub use notify::{LogNotifier, Notification, Notifier};
pub use shell::{LifecycleState, ShellWorker};
pub use store::{CacheStore, Entry, MemoryStore};
