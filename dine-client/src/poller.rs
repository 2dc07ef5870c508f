//! Polling synchronization
//!
//! A [`Poller`] fetches from a [`PollSource`] on a fixed interval and
//! publishes the latest snapshot on a `watch` channel. At most one fetch is
//! in flight: starting a fetch cancels the previous one. While the view is
//! [`Visibility::Hidden`] no ticks fire; becoming visible fetches at once
//! and restarts the interval. Background failures are logged at debug and
//! dropped; [`Poller::refresh`] returns them to the caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shared::models::{HistoryQuery, Order};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{ClientError, ClientResult, HttpClient};

/// Something that can be fetched repeatedly
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    async fn fetch(&self) -> ClientResult<Self::Output>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Lets the UI layer report whether the polled view is on screen
#[derive(Clone)]
pub struct VisibilityHandle {
    tx: Arc<watch::Sender<Visibility>>,
}

impl VisibilityHandle {
    pub fn set(&self, visibility: Visibility) {
        self.tx.send_if_modified(|current| {
            let changed = *current != visibility;
            *current = visibility;
            changed
        });
    }

    pub fn show(&self) {
        self.set(Visibility::Visible);
    }

    pub fn hide(&self) {
        self.set(Visibility::Hidden);
    }

    pub fn get(&self) -> Visibility {
        *self.tx.borrow()
    }
}

struct Shared<T> {
    source: Arc<dyn PollSource<Output = T>>,
    snapshot: watch::Sender<Option<T>>,
    in_flight: Mutex<CancellationToken>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    /// Cancel whatever is running and hand out the token for the next fetch
    fn begin(&self) -> CancellationToken {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        slot.cancel();
        *slot = CancellationToken::new();
        slot.clone()
    }

    fn cancel_in_flight(&self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    async fn fetch(&self) -> ClientResult<T> {
        let token = self.begin();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::Cancelled),
            result = self.source.fetch() => result,
        };
        if let Ok(value) = &result {
            self.snapshot.send_replace(Some(value.clone()));
        }
        result
    }
}

fn spawn_fetch<T: Clone + Send + Sync + 'static>(shared: &Arc<Shared<T>>) {
    let shared = shared.clone();
    tokio::spawn(async move {
        match shared.fetch().await {
            Ok(_) => {}
            Err(ClientError::Cancelled) => tracing::debug!("Poll superseded"),
            Err(e) => tracing::debug!(error = %e, "Background poll failed"),
        }
    });
}

async fn run<T: Clone + Send + Sync + 'static>(
    shared: Arc<Shared<T>>,
    mut visibility: watch::Receiver<Visibility>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let visible = *visibility.borrow_and_update() == Visibility::Visible;
        if visible {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => spawn_fetch(&shared),
                changed = visibility.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        } else {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = visibility.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if *visibility.borrow() == Visibility::Visible {
                        // Next tick fires now, then every `period`
                        ticker.reset_immediately();
                    }
                }
            }
        }
        if *visibility.borrow() == Visibility::Hidden {
            shared.cancel_in_flight();
        }
    }

    shared.cancel_in_flight();
    tracing::debug!("Poller stopped");
}

/// Fixed-interval poller; stops on [`Poller::shutdown`] or drop
pub struct Poller<T> {
    shared: Arc<Shared<T>>,
    snapshot: watch::Receiver<Option<T>>,
    visibility: VisibilityHandle,
    shutdown: CancellationToken,
    period: Duration,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    /// Start polling; must be called inside a tokio runtime.
    ///
    /// The first fetch runs immediately.
    pub fn spawn(source: impl PollSource<Output = T>, period: Duration) -> Self {
        let (snapshot_tx, snapshot) = watch::channel(None);
        let (visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);
        let shared = Arc::new(Shared {
            source: Arc::new(source),
            snapshot: snapshot_tx,
            in_flight: Mutex::new(CancellationToken::new()),
        });
        let shutdown = CancellationToken::new();

        tokio::spawn(run(
            shared.clone(),
            visibility_rx,
            period,
            shutdown.clone(),
        ));

        Self {
            shared,
            snapshot,
            visibility: VisibilityHandle {
                tx: Arc::new(visibility_tx),
            },
            shutdown,
            period,
        }
    }

    /// Latest successful snapshot, `None` until the first fetch lands
    pub fn latest(&self) -> Option<T> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.snapshot.clone()
    }

    pub fn visibility(&self) -> VisibilityHandle {
        self.visibility.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// User-initiated fetch; supersedes a running background fetch
    pub async fn refresh(&self) -> ClientResult<T> {
        self.shared.fetch().await
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.shared.cancel_in_flight();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// =============================================================================
// Concrete pollers
// =============================================================================

/// Customer order-status page: the table's orders every 3 s
pub struct OrderStatusWatcher {
    client: HttpClient,
    table_id: i64,
}

impl OrderStatusWatcher {
    pub const PERIOD: Duration = Duration::from_secs(3);

    pub fn new(client: HttpClient, table_id: i64) -> Self {
        Self { client, table_id }
    }

    pub fn spawn(client: HttpClient, table_id: i64) -> Poller<Vec<Order>> {
        Poller::spawn(Self::new(client, table_id), Self::PERIOD)
    }
}

#[async_trait]
impl PollSource for OrderStatusWatcher {
    type Output = Vec<Order>;

    async fn fetch(&self) -> ClientResult<Vec<Order>> {
        self.client.table_orders(self.table_id).await
    }
}

/// Admin transaction view: order history every 5 s
pub struct TransactionFeed {
    client: HttpClient,
    query: HistoryQuery,
}

impl TransactionFeed {
    pub const PERIOD: Duration = Duration::from_secs(5);

    pub fn new(client: HttpClient, query: HistoryQuery) -> Self {
        Self { client, query }
    }

    pub fn spawn(client: HttpClient, query: HistoryQuery) -> Poller<Vec<Order>> {
        Poller::spawn(Self::new(client, query), Self::PERIOD)
    }
}

#[async_trait]
impl PollSource for TransactionFeed {
    type Output = Vec<Order>;

    async fn fetch(&self) -> ClientResult<Vec<Order>> {
        self.client.order_history(&self.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};
    use tokio::time::sleep;

    /// Counts calls; returns the call number, optionally slow or failing
    #[derive(Clone, Default)]
    struct Counter {
        started: Arc<AtomicUsize>,
        delay: Option<Duration>,
        fail: Arc<AtomicBool>,
    }

    #[async_trait]
    impl PollSource for Counter {
        type Output = usize;

        async fn fetch(&self) -> ClientResult<usize> {
            let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::from_response(500, r#"{"code":9001,"message":"boom"}"#));
            }
            Ok(n)
        }
    }

    const PERIOD: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_every_period() {
        let source = Counter::default();
        let poller = Poller::spawn(source.clone(), PERIOD);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 1);
        assert_eq!(poller.latest(), Some(1));

        sleep(PERIOD).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 2);

        sleep(PERIOD * 2).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 4);
        assert_eq!(poller.latest(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_pauses_and_visible_fetches_now() {
        let source = Counter::default();
        let poller = Poller::spawn(source.clone(), PERIOD);
        sleep(Duration::from_millis(10)).await;

        poller.visibility().hide();
        sleep(PERIOD * 5).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 1);

        poller.visibility().show();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 2);

        // Interval restarted from the visible moment
        sleep(PERIOD - Duration::from_millis(100)).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 2);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_is_superseded_by_next_tick() {
        let source = Counter {
            delay: Some(PERIOD * 2),
            ..Default::default()
        };
        let poller = Poller::spawn(source.clone(), PERIOD);

        sleep(PERIOD * 3 + Duration::from_millis(10)).await;
        // Four fetches started, each cancelled by the next before finishing
        assert_eq!(source.started.load(Ordering::SeqCst), 4);
        assert_eq!(poller.latest(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_errors_are_swallowed_refresh_errors_are_not() {
        let source = Counter::default();
        let poller = Poller::spawn(source.clone(), PERIOD);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(poller.latest(), Some(1));

        source.fail.store(true, Ordering::SeqCst);
        sleep(PERIOD).await;
        // Failed tick keeps the last good snapshot
        assert_eq!(poller.latest(), Some(1));

        let err = poller.refresh().await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        source.fail.store(false, Ordering::SeqCst);
        let value = poller.refresh().await.unwrap();
        assert_eq!(poller.latest(), Some(value));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let source = Counter::default();
        let poller = Poller::spawn(source.clone(), PERIOD);
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(1));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(2));
    }

    /// Gets superseded just before its own result is ready
    struct SupersededOnReturn {
        shared: Arc<OnceLock<Weak<Shared<usize>>>>,
    }

    #[async_trait]
    impl PollSource for SupersededOnReturn {
        type Output = usize;

        async fn fetch(&self) -> ClientResult<usize> {
            if let Some(shared) = self.shared.get().and_then(Weak::upgrade) {
                shared.cancel_in_flight();
            }
            tokio::task::yield_now().await;
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_a_ready_result() {
        let slot = Arc::new(OnceLock::new());
        let (snapshot, rx) = watch::channel(None);
        let shared = Arc::new(Shared {
            source: Arc::new(SupersededOnReturn {
                shared: slot.clone(),
            }),
            snapshot,
            in_flight: Mutex::new(CancellationToken::new()),
        });
        let _ = slot.set(Arc::downgrade(&shared));

        for _ in 0..32 {
            let err = shared.fetch().await.unwrap_err();
            assert!(matches!(err, ClientError::Cancelled));
        }
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let source = Counter::default();
        let poller = Poller::spawn(source.clone(), PERIOD);
        sleep(Duration::from_millis(10)).await;

        poller.shutdown();
        assert!(poller.is_shut_down());
        sleep(PERIOD * 4).await;
        assert_eq!(source.started.load(Ordering::SeqCst), 1);
    }
}
