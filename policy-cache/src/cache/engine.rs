use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::pipeline::{self, Deadline, Producer, Task};
use super::policy::EvictionPolicy;
use crate::core::{
    CacheError, CachePolicy, CacheStats, Node, OrderingList, Result, SlotId, StatsRecorder,
};

/// Default maximum number of resident entries
pub const DEFAULT_LIMIT: usize = 1000;
/// Default ordering queue depth (insertions and promotions)
pub const DEFAULT_ORDERING_QUEUE_CAPACITY: usize = 1000;
/// Default eviction signal queue depth
pub const DEFAULT_EVICT_QUEUE_CAPACITY: usize = 16;

/// Construction options of a cache engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum resident entries
    pub limit: usize,
    /// Purge entries idle longer than this (LFU only)
    pub idle_expiry: Option<Duration>,
    /// Depth of the queue carrying insertions and promotions
    pub ordering_queue_capacity: usize,
    pub evict_queue_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            idle_expiry: None,
            ordering_queue_capacity: DEFAULT_ORDERING_QUEUE_CAPACITY,
            evict_queue_capacity: DEFAULT_EVICT_QUEUE_CAPACITY,
        }
    }
}

impl EngineOptions {
    /// Check the options against the policy they are meant for
    pub fn validate(&self, policy: CachePolicy) -> Result<()> {
        if self.limit == 0 {
            return Err(CacheError::InvalidLimit(self.limit));
        }

        if let Some(period) = self.idle_expiry {
            if policy != CachePolicy::Lfu {
                return Err(CacheError::ConfigurationMismatch {
                    option: "idle_expiry",
                    policy,
                });
            }
            if period.is_zero() {
                return Err(CacheError::InvalidIdleExpiry);
            }
        }

        for (name, capacity) in [
            ("ordering", self.ordering_queue_capacity),
            ("evict", self.evict_queue_capacity),
        ] {
            if capacity == 0 {
                return Err(CacheError::InvalidQueueCapacity(name));
            }
        }

        Ok(())
    }
}

/// Job on the ordering queue
///
/// Insertions and promotions share one FIFO, so a promotion is always applied
/// after the insertion of its node and before any later insertion (and the
/// eviction that insertion may trigger).
pub(crate) enum Job {
    Insert(SlotId),
    Promote(String),
}

/// Index and ordering list, always mutated together
pub(crate) struct State<V> {
    pub(crate) index: HashMap<String, SlotId>,
    pub(crate) list: OrderingList<V>,
}

/// State shared between the facade and the maintenance workers
pub(crate) struct Shared<V, P> {
    pub(crate) state: RwLock<State<V>>,
    policy: P,
    limit: usize,
    idle_expiry: Option<Duration>,
    stats: StatsRecorder,
    closed: AtomicBool,
}

impl<V, P: EvictionPolicy> Shared<V, P> {
    /// Link a pending node; true if the list went over the limit
    fn link(&self, id: SlotId) -> bool {
        let mut state = self.state.write();
        if !self.policy.insert(&mut state.list, id) {
            debug!("Insert skipped, slot {} no longer pending", id.index());
            return false;
        }
        self.stats.record_insert();
        state.list.len() > self.limit
    }

    /// Evict the tail if the list is still over the limit
    fn evict_one(&self) {
        let mut state = self.state.write();
        if state.list.len() <= self.limit {
            return;
        }

        if let Some(victim) = state.list.evict_tail() {
            state.index.remove(&victim.key);
            self.stats.record_eviction();
            debug!("EVICT key={}", victim.key);
        }
    }

    fn promote(&self, key: &str) {
        let mut state = self.state.write();
        let Some(&id) = state.index.get(key) else {
            debug!("Promotion skipped, key={} already evicted", key);
            return;
        };
        self.policy.promote(&mut state.list, id);
    }

    /// Remove every linked node idle for longer than `period`
    fn purge_idle(&self, period: Duration) -> usize {
        let mut state = self.state.write();
        let State { index, list } = &mut *state;

        let idle: Vec<SlotId> = list
            .iter_ids()
            .filter(|id| {
                list.get(*id)
                    .is_some_and(|node| node.idle_for() > period)
            })
            .collect();

        for id in &idle {
            if let Some(node) = list.free(*id) {
                index.remove(&node.key);
            }
        }

        self.stats.record_expirations(idle.len() as u64);
        idle.len()
    }

    fn is_idle(&self, node: &Node<V>) -> bool {
        self.idle_expiry
            .is_some_and(|period| node.idle_for() > period)
    }
}

/// Cache facade over the index, the ordering list and the maintenance
/// pipeline, parameterized by its eviction policy
///
/// `get` and `set` only touch the index under the lock; list insertion,
/// promotion, eviction and idle purging happen on background workers.
pub struct CacheEngine<V, P: EvictionPolicy> {
    shared: Arc<Shared<V, P>>,
    ordering_tx: Producer<Job>,
    evict_tx: Producer<()>,
    stop_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<V: Send + Sync + 'static, P: EvictionPolicy> CacheEngine<V, P> {
    /// Create a cache and start its maintenance workers
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_options(policy: P, options: EngineOptions) -> Result<Self> {
        options.validate(P::KIND)?;

        info!(
            "Initializing {} cache with limit={}, idle_expiry={:?}",
            P::KIND,
            options.limit,
            options.idle_expiry
        );

        let shared = Arc::new(Shared {
            state: RwLock::new(State {
                index: HashMap::with_capacity(options.limit.min(DEFAULT_LIMIT)),
                list: OrderingList::with_capacity(options.limit.min(DEFAULT_LIMIT)),
            }),
            policy,
            limit: options.limit,
            idle_expiry: options.idle_expiry,
            stats: StatsRecorder::default(),
            closed: AtomicBool::new(false),
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let (ordering_tx, ordering_rx) =
            pipeline::queue("ordering", options.ordering_queue_capacity);
        let (evict_tx, evict_rx) = pipeline::queue("evict", options.evict_queue_capacity);

        let mut workers = vec![
            tokio::spawn(Self::ordering_loop(
                Arc::clone(&shared),
                ordering_rx,
                evict_tx.clone(),
                stop_rx.clone(),
            )),
            tokio::spawn(Self::evict_loop(
                Arc::clone(&shared),
                evict_rx,
                stop_rx.clone(),
            )),
        ];

        if let Some(period) = options.idle_expiry {
            workers.push(tokio::spawn(Self::sweep_loop(
                Arc::clone(&shared),
                period,
                stop_rx,
            )));
        }

        Ok(Self {
            shared,
            ordering_tx,
            evict_tx,
            stop_tx,
            workers: Mutex::new(workers),
        })
    }

    /// Store a value unless the key is already present (first write wins)
    pub async fn set(&self, key: &str, value: V) {
        self.set_with(key, value, Deadline::none()).await
    }

    /// Store a value, abandoning the insertion if it cannot be queued before
    /// `deadline`; with no deadline a full queue abandons it at once
    ///
    /// An abandoned insertion is rolled back from the index, so the key is
    /// simply not cached.
    pub async fn set_with(&self, key: &str, value: V, deadline: Deadline) {
        if self.is_closed() {
            debug!("SET on closed cache ignored, key={}", key);
            return;
        }

        let id = {
            let mut state = self.shared.state.write();
            if state.index.contains_key(key) {
                debug!("SET key={} already present, keeping first value", key);
                return;
            }
            let id = state.list.alloc(Node::new(key, value));
            state.index.insert(key.to_string(), id);
            id
        };

        if let Err(e) = self.ordering_tx.offer(Job::Insert(id), deadline).await {
            warn!("Insertion of key={} abandoned: {}", key, e);
            let mut state = self.shared.state.write();
            if state.index.get(key) == Some(&id) {
                state.index.remove(key);
                state.list.free(id);
            }
            self.shared.stats.record_abandoned_insert();
        }
    }

    /// Remove every entry and stop the workers; later calls are no-ops
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Closing {} cache", P::KIND);
        self.stop_tx.send_replace(true);

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Cache worker ended abnormally: {}", e);
            }
        }

        let mut state = self.shared.state.write();
        state.index.clear();
        state.list.clear();
    }

    /// Wait until every maintenance job queued before this call is applied
    pub async fn flush(&self) {
        if let Err(e) = self.ordering_tx.barrier().await {
            debug!("Flush stopped: {}", e);
            return;
        }
        if let Err(e) = self.evict_tx.barrier().await {
            debug!("Flush stopped: {}", e);
        }
    }

    /// Number of keys in the index, including ones not yet linked
    pub fn len(&self) -> usize {
        self.shared.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes linked into the ordering list
    pub fn resident(&self) -> usize {
        self.shared.state.read().list.len()
    }

    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    pub fn policy(&self) -> CachePolicy {
        P::KIND
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Keys in eviction order, head (kept longest) to tail (next victim)
    pub fn ordered_keys(&self) -> Vec<String> {
        self.shared.state.read().list.keys()
    }

    /// Access frequencies in list order
    pub fn frequencies(&self) -> Vec<u64> {
        let state = self.shared.state.read();
        state.list.iter().map(|node| node.frequency).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot()
    }

    async fn ordering_loop(
        shared: Arc<Shared<V, P>>,
        mut rx: mpsc::Receiver<Task<Job>>,
        evict_tx: Producer<()>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("{} ordering worker started", P::KIND);

        while let Some(job) = pipeline::next_task(&mut rx, &mut stop).await {
            let id = match job {
                Job::Promote(key) => {
                    shared.promote(&key);
                    continue;
                }
                Job::Insert(id) => id,
            };
            if !shared.link(id) {
                continue;
            }
            // One eviction per insertion that crosses the limit
            if let Err(e) = evict_tx.push((), Deadline::none()).await {
                debug!("Eviction signal dropped: {}", e);
                break;
            }
        }

        info!("{} ordering worker stopped", P::KIND);
    }

    async fn evict_loop(
        shared: Arc<Shared<V, P>>,
        mut rx: mpsc::Receiver<Task<()>>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("{} evict worker started", P::KIND);

        while pipeline::next_task(&mut rx, &mut stop).await.is_some() {
            shared.evict_one();
        }

        info!("{} evict worker stopped", P::KIND);
    }

    async fn sweep_loop(
        shared: Arc<Shared<V, P>>,
        period: Duration,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("Starting idle sweep (period={:?})", period);
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    let purged = shared.purge_idle(period);
                    if purged > 0 {
                        debug!("Purged {} idle entries", purged);
                    }
                }
            }
        }

        info!("Idle sweep stopped");
    }
}

impl<V: Clone + Send + Sync + 'static, P: EvictionPolicy> CacheEngine<V, P> {
    /// Look up a value; a hit refreshes the access time and schedules a
    /// promotion without waiting for it
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_with(key, Deadline::none()).await
    }

    /// Look up a value; a hit schedules a promotion, waiting for queue
    /// capacity until `deadline` (with no deadline, a full queue drops it)
    pub async fn get_with(&self, key: &str, deadline: Deadline) -> Option<V> {
        let value = {
            let state = self.shared.state.read();
            let node = state.index.get(key).and_then(|id| state.list.get(*id));
            match node {
                Some(node) if !self.shared.is_idle(node) => {
                    node.mark_used();
                    Some(node.value.clone())
                }
                _ => None,
            }
        };

        let Some(value) = value else {
            self.shared.stats.record_miss();
            return None;
        };
        self.shared.stats.record_hit();

        let job = Job::Promote(key.to_string());
        if let Err(e) = self.ordering_tx.offer(job, deadline).await {
            debug!("Promotion of key={} dropped: {}", key, e);
            self.shared.stats.record_dropped_promotion();
        }

        Some(value)
    }
}

impl<V, P: EvictionPolicy> Drop for CacheEngine<V, P> {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}
