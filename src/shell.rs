//! The shell worker: offline-cache lifecycle and request routing.
//!
//! One worker owns one current cache generation. It is driven entirely by
//! the host: `install`, `activate`, `handle_request`, `handle_push` and
//! `handle_notification_click` are the only entry points, each an
//! independent cooperative task suspending at cache and network I/O.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::{StreamExt, stream};

use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::http::{Request, Response};
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::store::{CacheStore, MemoryStore};

/// Lifecycle states of the shell worker.
///
/// `Active` is the steady state for the lifetime of the worker; there is
/// no terminal state short of tearing the worker down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// No generation has been installed yet.
    Uninstalled = 0,
    /// Install in progress: assets are being fetched into a new generation.
    Installing = 1,
    /// Install complete, waiting for activation.
    Installed = 2,
    /// Activation in progress: stale generations are being deleted.
    Activating = 3,
    /// Serving intercepted requests.
    Active = 4,
}

impl LifecycleState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Installing,
            2 => Self::Installed,
            3 => Self::Activating,
            4 => Self::Active,
            _ => Self::Uninstalled,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninstalled => "uninstalled",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

/// How many asset fetches run in parallel during install.
const INSTALL_CONCURRENCY: usize = 4;

/// Offline cache controller for the Kukaya app shell.
///
/// Serves cached content immediately while refreshing it from the network
/// in the background (stale-while-revalidate), with an offline-page
/// fallback for failed navigations.
pub struct ShellWorker<S = MemoryStore, F = ReqwestFetcher, N = LogNotifier> {
    store: Arc<S>,
    fetcher: Arc<F>,
    notifier: Arc<N>,
    config: ShellConfig,
    state: AtomicU8,
}

impl ShellWorker<MemoryStore, ReqwestFetcher, LogNotifier> {
    /// Creates a worker with the default in-memory store and a
    /// reqwest-backed fetcher resolving against the configured API origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API base URL is invalid.
    pub fn new(config: ShellConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(&config.api_base_url)?;
        Ok(Self::with_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(fetcher),
            Arc::new(LogNotifier),
        ))
    }
}

impl<S, F, N> ShellWorker<S, F, N>
where
    S: CacheStore + 'static,
    F: Fetcher + 'static,
    N: Notifier,
{
    /// Creates a worker from caller-supplied backends.
    #[must_use]
    pub fn with_parts(config: ShellConfig, store: Arc<S>, fetcher: Arc<F>, notifier: Arc<N>) -> Self {
        Self {
            store,
            fetcher,
            notifier,
            config,
            state: AtomicU8::new(LifecycleState::Uninstalled as u8),
        }
    }

    /// Returns the worker's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns a reference to the worker configuration.
    #[must_use]
    pub const fn config(&self) -> &ShellConfig {
        &self.config
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Installs the current generation: fetches and stores every asset-set
    /// path, all or nothing.
    ///
    /// With eager takeover configured, a successful install activates
    /// immediately instead of waiting for prior generations to be
    /// released, trading a brief inconsistency window for faster rollout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetFetch`] if any required asset cannot be
    /// retrieved; the partially filled generation is deleted so the app
    /// shell is never partially cached.
    pub async fn install(&self) -> Result<()> {
        self.set_state(LifecycleState::Installing);
        let generation = self.config.generation();
        log::info!("installing cache generation {generation}");

        self.store.open(&generation).await?;

        // Fetch the whole asset set up front with bounded parallelism;
        // nothing is stored until every fetch has come back usable.
        let fetched: Vec<(String, Result<Response>)> =
            stream::iter(self.config.asset_set.clone())
                .map(|path| {
                    let fetcher = Arc::clone(&self.fetcher);
                    async move {
                        let result = fetcher.fetch(&Request::get(path.clone())).await;
                        (path, result)
                    }
                })
                .buffer_unordered(INSTALL_CONCURRENCY)
                .collect()
                .await;

        for (path, result) in &fetched {
            let reason = match result {
                Ok(response) if response.is_cacheable() => continue,
                Ok(response) if !response.ok() => {
                    format!("unexpected status {}", response.status)
                }
                Ok(_) => "response not cacheable".to_string(),
                Err(e) => e.to_string(),
            };

            self.store.delete(&generation).await?;
            self.set_state(LifecycleState::Uninstalled);
            log::error!("install of {generation} aborted: {path}: {reason}");
            return Err(Error::AssetFetch {
                path: path.clone(),
                reason,
            });
        }

        for (path, result) in fetched {
            if let Ok(response) = result {
                self.store.put(&generation, &path, response).await?;
            }
        }

        self.set_state(LifecycleState::Installed);
        log::info!(
            "installed {generation} with {} assets",
            self.config.asset_set.len()
        );

        if self.config.eager_takeover {
            self.activate().await?;
        }
        Ok(())
    }

    /// Activates the current generation, deleting every other generation
    /// in storage. Idempotent when no stale generations exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot enumerate or delete
    /// generations.
    pub async fn activate(&self) -> Result<()> {
        self.set_state(LifecycleState::Activating);
        let current = self.config.generation();

        for name in self.store.generations().await? {
            if name != current {
                self.store.delete(&name).await?;
                log::info!("deleted stale cache generation {name}");
            }
        }

        if self.config.claim_clients {
            log::debug!("claiming open clients for {current}");
        }

        self.set_state(LifecycleState::Active);
        Ok(())
    }

    /// Routes an intercepted request.
    ///
    /// Non-GET requests pass through to the network untouched. For GETs, a
    /// cached entry is returned immediately and refreshed in the
    /// background; a miss awaits the network. A failed network fetch falls
    /// back to the offline page for navigations, and propagates otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error only when both the network and every applicable
    /// cached fallback are unavailable.
    pub async fn handle_request(&self, request: Request) -> Result<Response> {
        if !request.method.is_get() {
            return self.fetcher.fetch(&request).await;
        }

        let generation = self.config.generation();

        if let Some(entry) = self.store.lookup(&generation, &request.url).await? {
            self.revalidate(request);
            return Ok(entry.response);
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store
                        .put(&generation, &request.url, response.clone())
                        .await?;
                }
                Ok(response)
            }
            Err(err) => {
                if request.is_navigation()
                    && let Some(entry) = self
                        .store
                        .lookup(&generation, &self.config.offline_page)
                        .await?
                {
                    log::warn!(
                        "network unavailable for {}; serving offline page",
                        request.url
                    );
                    return Ok(entry.response);
                }
                Err(err)
            }
        }
    }

    /// Refreshes a cached entry from the network without blocking the
    /// request that hit the cache. Failures are logged, never surfaced;
    /// racing refreshes of one URL resolve last-writer-wins.
    fn revalidate(&self, request: Request) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let generation = self.config.generation();

        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    if let Err(e) = store.put(&generation, &request.url, response).await {
                        log::error!("cache refresh for {} failed: {e}", request.url);
                    }
                }
                Ok(response) => {
                    log::debug!(
                        "not refreshing {} from uncacheable response ({})",
                        request.url,
                        response.status
                    );
                }
                Err(e) => {
                    log::debug!("background refresh of {} failed: {e}", request.url);
                }
            }
        });
    }

    /// Surfaces a notification for a received push message. Malformed or
    /// absent payloads fall back to the default notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notifier cannot display the notification.
    pub async fn handle_push(&self, data: Option<&[u8]>) -> Result<()> {
        let notification = Notification::from_push(data);
        self.notifier.show(&notification).await
    }

    /// Dismisses the notification and focuses (or opens) the app root.
    ///
    /// # Errors
    ///
    /// Returns an error if the notifier cannot act on the click.
    pub async fn handle_notification_click(&self) -> Result<()> {
        self.notifier.dismiss().await?;
        self.notifier.focus_or_open("/").await
    }
}
