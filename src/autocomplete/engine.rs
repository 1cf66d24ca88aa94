//! The completion engine: a published candidate snapshot plus the background
//! refresh that replaces it.
//!
//! Readers take an `Arc` to the current [`CandidateSet`] and match against it
//! without ever waiting on the database. Writers build a complete new set off
//! the completion path and swap the reference in one short critical section.
//! Every connect, disconnect and refresh request draws a number from a
//! monotonically increasing sequence; a result is only published when its
//! number is newer than the snapshot's, so a slow fetch can never overwrite the
//! result of a request that started after it.
use crate::*;
use std::{
    collections::BTreeSet,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::task::JoinHandle;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound for a single metadata fetch.
    pub fetch_timeout: Duration,
    /// Include the static keyword and function vocabulary, not only what the
    /// server advertises.
    pub standard_keywords: bool,
    pub match_options: MatchOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            standard_keywords: true,
            match_options: MatchOptions::default(),
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            standard_keywords: true,
            match_options: MatchOptions {
                schema_only_after_dot: config.schema_only_after_dot,
            },
        }
    }
}

/// How a background refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RefreshOutcome {
    /// The new set is now served.
    #[display("published")]
    Published,
    /// A newer request (refresh, connect or disconnect) got there first.
    #[display("superseded")]
    Superseded,
    /// The fetch failed; the previous set keeps being served.
    #[display("failed")]
    Failed,
}

struct Connection<S> {
    source: Arc<S>,
    keywords: Arc<BTreeSet<String>>,
}

impl<S> Clone for Connection<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            keywords: Arc::clone(&self.keywords),
        }
    }
}

#[derive(Default)]
struct Published {
    seq: u64,
    candidates: Option<Arc<CandidateSet>>,
}

struct Shared<S> {
    connection: RwLock<Option<Connection<S>>>,
    published: RwLock<Published>,
    next_seq: AtomicU64,
}

impl<S: MetadataSource> Shared<S> {
    fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn connection(&self) -> Option<Connection<S>> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the connection and reset to no candidates.
    ///
    /// Sequence numbers are drawn under the connection write lock, and
    /// [`start_refresh`](Self::start_refresh) draws its number under the read
    /// lock, so every refresh that saw the previous connection is numbered
    /// below the reset. Returns the number for the new connection's initial build.
    fn attach(&self, connection: Option<Connection<S>>) -> u64 {
        let mut current = self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = connection;
        let reset = self.begin();
        self.publish(reset, None);
        self.begin()
    }

    /// The current connection with a sequence number drawn while it is current.
    fn start_refresh(&self) -> Option<(u64, Connection<S>)> {
        let current = self
            .connection
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let connection = current.clone()?;
        Some((self.begin(), connection))
    }

    fn snapshot(&self) -> Option<Arc<CandidateSet>> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .candidates
            .clone()
    }

    /// Swap in `candidates` unless something newer than `seq` is already published.
    fn publish(&self, seq: u64, candidates: Option<Arc<CandidateSet>>) -> bool {
        let mut published = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if seq <= published.seq {
            return false;
        }
        *published = Published { seq, candidates };
        true
    }

    async fn build(connection: &Connection<S>, timeout: Duration) -> Result<CandidateSet> {
        let names = tokio::time::timeout(timeout, connection.source.fetch_schema_names())
            .await
            .map_err(|_| MetadataError::Timeout(timeout))??;
        CandidateSet::with_keywords(Arc::clone(&connection.keywords), names)
    }

    async fn refresh(&self, seq: u64, connection: Connection<S>, timeout: Duration) -> RefreshOutcome {
        let candidates = match Self::build(&connection, timeout).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Schema refresh #{seq} failed, keeping the previous candidates: {e}");
                return RefreshOutcome::Failed;
            }
        };

        let size = candidates.len();
        if self.publish(seq, Some(Arc::new(candidates))) {
            debug!("Schema refresh #{seq} published {size} candidates");
            RefreshOutcome::Published
        } else {
            debug!("Schema refresh #{seq} superseded by a newer request");
            RefreshOutcome::Superseded
        }
    }
}

/// Serves completions for one session and keeps them in step with the schema.
///
/// Cheap to share behind an `Arc`: every method takes `&self`, and completion
/// calls never wait for one another or for a refresh in flight.
pub struct CompletionEngine<S: MetadataSource> {
    shared: Arc<Shared<S>>,
    options: EngineOptions,
    matcher: Matcher,
}

impl<S: MetadataSource> Default for CompletionEngine<S> {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl<S: MetadataSource> CompletionEngine<S> {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                connection: RwLock::new(None),
                published: RwLock::new(Published::default()),
                next_seq: AtomicU64::new(0),
            }),
            options,
            matcher: Matcher::new(options.match_options),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Take over `source` and build the first candidate set from it.
    ///
    /// Any previous connection is released and its in-flight refreshes are
    /// discarded. Keywords are gathered once here and reused by every later
    /// refresh. When the initial fetch fails the engine stays `Stale` (no
    /// completions) and the error is returned; the connection is still kept so
    /// a later [`notify_schema_may_have_changed`](Self::notify_schema_may_have_changed)
    /// can recover.
    pub async fn on_connect(&self, source: S) -> Result {
        let timeout = self.options.fetch_timeout;
        let keywords = if self.options.standard_keywords {
            KeywordSource.collect(&source, timeout).await
        } else {
            KeywordSource.advertised(&source, timeout).await
        };
        let connection = Connection {
            source: Arc::new(source),
            keywords: Arc::new(keywords),
        };

        let seq = self.shared.attach(Some(connection.clone()));
        info!(
            "Connected, building candidates from {} keywords",
            connection.keywords.len()
        );

        match Shared::build(&connection, timeout).await {
            Ok(candidates) => {
                let size = candidates.len();
                if self.shared.publish(seq, Some(Arc::new(candidates))) {
                    info!("Initial candidate set published with {size} candidates");
                } else {
                    debug!("Initial candidate set superseded by a newer request");
                }
                Ok(())
            }
            Err(e) => {
                error!("Initial metadata fetch failed, completions unavailable: {e}");
                Err(e)
            }
        }
    }

    /// Release the connection and stop serving completions.
    pub fn on_disconnect(&self) {
        self.shared.attach(None);
        info!("Disconnected, candidates discarded");
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connection().is_some()
    }

    /// Re-fetch schema names in the background and publish a new candidate set.
    ///
    /// Returns immediately. `None` when there is no connection or no tokio
    /// runtime to run the fetch on. The returned handle is only informative;
    /// dropping it does not cancel the refresh.
    pub fn notify_schema_may_have_changed(&self) -> Option<JoinHandle<RefreshOutcome>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            if self.is_connected() {
                warn!("Schema change notified outside a tokio runtime, refresh skipped");
            }
            return None;
        };
        let Some((seq, connection)) = self.shared.start_refresh() else {
            debug!("Schema change notified while disconnected, ignoring");
            return None;
        };

        let shared = Arc::clone(&self.shared);
        let timeout = self.options.fetch_timeout;
        debug!("Starting schema refresh #{seq}");
        Some(runtime.spawn(async move { shared.refresh(seq, connection, timeout).await }))
    }

    /// Completions for the partial token ending at byte offset `cursor`.
    ///
    /// Fails with `InvalidArgument` for a cursor outside the buffer or inside a
    /// character, and with `NotReady` while no candidate set is published.
    pub fn complete(&self, buffer: &str, cursor: usize) -> Result<Vec<String>> {
        match self.shared.snapshot() {
            Some(candidates) => self.matcher.complete(&candidates, buffer, cursor),
            None => {
                extract_partial_token(buffer, cursor)?;
                Err(Error::NotReady)
            }
        }
    }

    /// Like [`complete`](Self::complete), but any error degrades to no completions.
    pub fn completion(&self, buffer: &str, cursor: usize) -> Vec<String> {
        self.complete(buffer, cursor).unwrap_or_else(|e| {
            debug!("No completions at {cursor}: {e}");
            Vec::new()
        })
    }

    /// The currently published candidate set, if any.
    pub fn candidates(&self) -> Option<Arc<CandidateSet>> {
        self.shared.snapshot()
    }

    pub fn state(&self) -> RefreshState {
        match self.shared.snapshot() {
            Some(_) => RefreshState::Fresh,
            None => RefreshState::Stale,
        }
    }
}
