//! Live feed synchronizer.
//!
//! One instance backs one mounted view. A cooperative ticker issues a fetch on
//! every interval boundary (the first one immediately); search changes and
//! manual refreshes issue extra fetches without touching the ticker.
//!
//! ## Ordering
//! Every fetch takes the next sequence number and the search term at issue time.
//! A response is considered only when its sequence number is higher than that of
//! every fetch completed before it, successful or not, so a slow answer to an old
//! search can never overwrite a newer one. Nothing is cancelled over the wire.
//!
//! ## Failures
//! A failed fetch leaves the previous snapshot in place but still counts as the
//! newest completed fetch. It is not retried out of cycle; the next tick is the
//! retry.

use crate::domain::models::{AggregateStats, ApplicationRecord, FeedSnapshot, ThreatCategory};
use crate::services::api::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedMode {
    #[default]
    Applications,
    /// Also pulls the threat category breakdown on every fetch.
    Analytics,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedQuery {
    pub search: String,
    pub mode: FeedMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedPage {
    pub records: Vec<ApplicationRecord>,
    pub stats: Option<AggregateStats>,
    pub threats: Option<Vec<ThreatCategory>>,
}

#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    async fn fetch(&self, query: &FeedQuery) -> Result<FeedPage, ApiError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Fetching,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchTrigger {
    Tick,
    Search,
    Manual,
}

#[derive(Clone, Copy, Debug)]
pub struct FeedConfig {
    pub interval: Duration,
    pub mode: FeedMode,
}

struct FeedState {
    search: String,
    next_sequence: u64,
    /// Highest sequence number of any completed fetch, failed ones included.
    highest_seen: u64,
    in_flight: usize,
    mounted: bool,
    snapshot: Option<Arc<FeedSnapshot>>,
}

struct Shared {
    source: Arc<dyn FeedSource>,
    mode: FeedMode,
    state: Mutex<FeedState>,
    published: watch::Sender<Option<Arc<FeedSnapshot>>>,
}

pub struct FeedSynchronizer {
    shared: Arc<Shared>,
    ticker: JoinHandle<()>,
}

impl FeedSynchronizer {
    /// Mounts the feed. Must be called inside a tokio runtime.
    pub fn start(
        source: Arc<dyn FeedSource>,
        config: FeedConfig,
        search: impl Into<String>,
    ) -> Self {
        let (published, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            source,
            mode: config.mode,
            state: Mutex::new(FeedState {
                search: search.into(),
                next_sequence: 0,
                highest_seen: 0,
                in_flight: 0,
                mounted: true,
                snapshot: None,
            }),
            published,
        });
        let period = config.interval.max(Duration::from_millis(1));
        let ticker = tokio::spawn(run_ticker(Arc::clone(&shared), period));
        Self { shared, ticker }
    }

    /// Replaces the search term and issues a fetch right away. Returns the
    /// sequence number of that fetch, or `None` when the term is unchanged.
    pub fn set_search(&self, term: impl Into<String>) -> Option<u64> {
        let term = term.into();
        {
            let mut st = self.shared.state.lock();
            if st.search == term {
                return None;
            }
            st.search = term;
        }
        self.shared.issue(FetchTrigger::Search)
    }

    /// Out-of-cycle fetch; the ticker keeps its schedule.
    pub fn refresh(&self) -> Option<u64> {
        self.shared.issue(FetchTrigger::Manual)
    }

    pub fn snapshot(&self) -> Option<Arc<FeedSnapshot>> {
        self.shared.state.lock().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<FeedSnapshot>>> {
        self.shared.published.subscribe()
    }

    pub fn search(&self) -> String {
        self.shared.state.lock().search.clone()
    }

    pub fn phase(&self) -> FeedPhase {
        if self.shared.state.lock().in_flight > 0 {
            FeedPhase::Fetching
        } else {
            FeedPhase::Idle
        }
    }

    /// Number of fetches issued so far (ticks, searches and manual refreshes).
    pub fn issued(&self) -> u64 {
        self.shared.state.lock().next_sequence
    }

    pub fn unmount(self) {}
}

impl Drop for FeedSynchronizer {
    fn drop(&mut self) {
        self.ticker.abort();
        // in-flight responses still land in `apply` and are dropped there
        self.shared.state.lock().mounted = false;
        debug!("feed unmounted");
    }
}

async fn run_ticker(shared: Arc<Shared>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if shared.issue(FetchTrigger::Tick).is_none() {
            break;
        }
    }
}

impl Shared {
    fn issue(self: &Arc<Self>, trigger: FetchTrigger) -> Option<u64> {
        let (sequence, search) = {
            let mut st = self.state.lock();
            if !st.mounted {
                return None;
            }
            st.next_sequence += 1;
            st.in_flight += 1;
            (st.next_sequence, st.search.clone())
        };
        debug!(sequence, ?trigger, search = %search, "feed fetch issued");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let query = FeedQuery {
                search,
                mode: shared.mode,
            };
            let result = shared.source.fetch(&query).await;
            shared.apply(sequence, query.search, result);
        });
        Some(sequence)
    }

    fn apply(&self, sequence: u64, search: String, result: Result<FeedPage, ApiError>) {
        let mut st = self.state.lock();
        st.in_flight = st.in_flight.saturating_sub(1);
        if !st.mounted {
            debug!(sequence, "feed response arrived after unmount; ignored");
            return;
        }
        if sequence <= st.highest_seen {
            debug!(
                sequence,
                highest_seen = st.highest_seen,
                "stale feed response discarded"
            );
            return;
        }
        st.highest_seen = sequence;
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(sequence, error = %err, "feed fetch failed; keeping previous snapshot");
                return;
            }
        };

        let snapshot = Arc::new(FeedSnapshot {
            sequence,
            search,
            records: page.records,
            stats: page.stats,
            threats: page.threats,
        });
        st.snapshot = Some(Arc::clone(&snapshot));
        // published under the lock so subscribers observe applies in order
        self.published.send_replace(Some(snapshot));
    }
}
