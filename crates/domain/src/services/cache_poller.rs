use crate::entities::{CacheSnapshot, TorrentHash};
use crate::repositories::CacheRepository;
use futures::stream::{self, Stream};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

// Oldest unanswered requests beyond this are abandoned.
const MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling(TorrentHash),
}

/// Shared between one poll loop and its in-flight requests. Teardown flips
/// `attached` under this lock, and every publication happens under it too.
#[derive(Debug)]
struct PublishGate {
    attached: bool,
    last_applied: u64,
    pending: BTreeMap<u64, AbortHandle>,
}

struct PollLoop {
    hash: TorrentHash,
    gate: Arc<Mutex<PublishGate>>,
    task: JoinHandle<()>,
}

impl PollLoop {
    fn stop(self) {
        lock(&self.gate).attached = false;
        // Dropping the loop future also drops its JoinSet, aborting in-flight fetches.
        self.task.abort();
        info!("🛑 Stopped cache polling for {}", self.hash);
    }
}

/// Keeps a live view of a torrent's cache by polling the backend on a fixed interval.
///
/// At most one poll loop exists at a time. Changing the hash tears the current loop
/// down before the next one starts, and nothing is published after teardown even if
/// a request issued earlier resolves later. Responses that resolve out of order are
/// dropped when a newer tick has already been published, and requests still
/// outstanding for older ticks are cancelled at that point. A backend that stops
/// answering altogether leaves at most a handful of requests outstanding.
///
/// Must be driven from within a tokio runtime.
pub struct CachePoller {
    repository: Arc<dyn CacheRepository>,
    interval: Duration,
    snapshot_tx: Arc<watch::Sender<Arc<CacheSnapshot>>>,
    active: Mutex<Option<PollLoop>>,
}

impl CachePoller {
    pub fn new(repository: Arc<dyn CacheRepository>, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(CacheSnapshot::empty()));
        Self {
            repository,
            interval,
            snapshot_tx: Arc::new(snapshot_tx),
            active: Mutex::new(None),
        }
    }

    /// Select the torrent to poll. `None` stops polling.
    pub fn set_hash(&self, hash: Option<TorrentHash>) {
        let mut active = lock(&self.active);

        if let (Some(current), Some(next)) = (active.as_ref(), hash.as_ref()) {
            if current.hash == *next {
                return;
            }
        }

        if let Some(previous) = active.take() {
            previous.stop();
        }

        if let Some(hash) = hash {
            *active = Some(self.spawn_loop(hash));
        }
    }

    /// Consumer teardown. Returns to `Idle`.
    pub fn detach(&self) {
        if let Some(previous) = lock(&self.active).take() {
            previous.stop();
        }
    }

    pub fn state(&self) -> PollerState {
        match lock(&self.active).as_ref() {
            Some(poll_loop) => PollerState::Polling(poll_loop.hash.clone()),
            None => PollerState::Idle,
        }
    }

    /// Latest published snapshot. Starts out empty.
    pub fn current(&self) -> Arc<CacheSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CacheSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Every snapshot published from now on. Intermediate values may be skipped
    /// by a slow consumer; the latest one is never lost.
    pub fn snapshots(&self) -> impl Stream<Item = Arc<CacheSnapshot>> + Send + 'static {
        stream::unfold(self.subscribe(), |mut rx| async move {
            rx.changed().await.ok()?;
            let snapshot = rx.borrow_and_update().clone();
            Some((snapshot, rx))
        })
    }

    fn spawn_loop(&self, hash: TorrentHash) -> PollLoop {
        let gate = Arc::new(Mutex::new(PublishGate {
            attached: true,
            last_applied: 0,
            pending: BTreeMap::new(),
        }));

        info!(
            "🔄 Started cache polling for {} every {}ms",
            hash,
            self.interval.as_millis()
        );

        let task = tokio::spawn(run_poll_loop(
            Arc::clone(&self.repository),
            hash.clone(),
            self.interval,
            Arc::clone(&gate),
            Arc::clone(&self.snapshot_tx),
        ));

        PollLoop { hash, gate, task }
    }
}

impl Drop for CachePoller {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn run_poll_loop(
    repository: Arc<dyn CacheRepository>,
    hash: TorrentHash,
    period: Duration,
    gate: Arc<Mutex<PublishGate>>,
    snapshot_tx: Arc<watch::Sender<Arc<CacheSnapshot>>>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Held across the spawn so the handle is registered before the fetch can look for it.
                let mut guard = lock(&gate);
                if !guard.attached {
                    break;
                }
                tick += 1;
                let handle = in_flight.spawn(fetch_and_publish(
                    Arc::clone(&repository),
                    hash.clone(),
                    tick,
                    Arc::clone(&gate),
                    Arc::clone(&snapshot_tx),
                ));
                guard.pending.insert(tick, handle);
                while guard.pending.len() > MAX_IN_FLIGHT {
                    if let Some((abandoned, handle)) = guard.pending.pop_first() {
                        debug!(hash = %hash, tick = abandoned, "abandoning unanswered cache request");
                        handle.abort();
                    }
                }
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

async fn fetch_and_publish(
    repository: Arc<dyn CacheRepository>,
    hash: TorrentHash,
    tick: u64,
    gate: Arc<Mutex<PublishGate>>,
    snapshot_tx: Arc<watch::Sender<Arc<CacheSnapshot>>>,
) {
    if !lock(&gate).attached {
        return;
    }

    let snapshot = match repository.get_cache(&hash).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(hash = %hash, tick, "cache fetch failed, publishing empty snapshot: {}", e);
            CacheSnapshot::empty()
        }
    };

    let mut gate = lock(&gate);
    if !gate.attached {
        trace!(hash = %hash, tick, "dropping response for detached poll loop");
        return;
    }
    if tick <= gate.last_applied {
        gate.pending.remove(&tick);
        trace!(
            hash = %hash,
            tick,
            last_applied = gate.last_applied,
            "dropping out-of-order response"
        );
        return;
    }
    gate.last_applied = tick;

    // Everything up to this tick is settled; older requests could only be discarded.
    let newer = gate.pending.split_off(&(tick + 1));
    for (superseded, handle) in std::mem::replace(&mut gate.pending, newer) {
        if superseded != tick {
            trace!(hash = %hash, tick = superseded, "cancelling superseded cache request");
            handle.abort();
        }
    }

    snapshot_tx.send_replace(Arc::new(snapshot));
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
