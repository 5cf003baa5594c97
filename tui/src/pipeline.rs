//! Input producer, dispatch consumer and the helper tasks around them.
//!
//! Every state change goes through one bounded queue and is applied by a single
//! consumer, one message at a time. Helper tasks (ticker, autoplay) only ever
//! send messages into that queue.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event};
use termines_core::{Autoplay, GameRecord};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::keys;
use crate::store::GameStore;

pub const QUEUE_CAPACITY: usize = 64;
pub const TICK_PERIOD: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Process-wide cancellation signal.
#[derive(Clone, Debug)]
pub struct Shutdown {
    notify: Arc<watch::Sender<bool>>,
    watch: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, watch) = watch::channel(false);
        Self {
            notify: Arc::new(notify),
            watch,
        }
    }

    pub fn cancel(&self) {
        self.notify.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.watch.borrow()
    }

    /// Resolves once [`Shutdown::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut watch = self.watch.clone();
        let _ = watch.wait_for(|&cancelled| cancelled).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a tracked task for as long as it runs.
#[derive(Clone, Debug)]
pub struct TaskToken {
    _sender: mpsc::Sender<()>,
}

/// Waits for every outstanding [`TaskToken`] to be dropped.
#[derive(Debug)]
pub struct TaskTracker {
    sender: mpsc::Sender<()>,
    done: mpsc::Receiver<()>,
}

impl TaskTracker {
    pub fn new() -> Self {
        let (sender, done) = mpsc::channel(1);
        Self { sender, done }
    }

    pub fn token(&self) -> TaskToken {
        TaskToken {
            _sender: self.sender.clone(),
        }
    }

    pub async fn wait(self) {
        let Self { sender, mut done } = self;
        drop(sender);
        // nothing is ever sent, this returns once the last token is gone
        let _ = done.recv().await;
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// What the consumer does after a message was handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Control {
    Skip,
    Redraw,
    /// Clear the screen before drawing.
    FullRedraw,
    Quit,
}

/// Owner of all mutable state; runs one message at a time.
pub trait Handler: Send + 'static {
    type Msg: Send + 'static;

    fn handle(&mut self, msg: Self::Msg) -> Control;
}

/// Non-blocking send; a full queue drops `msg`.
pub fn forward<M>(tx: &mpsc::Sender<M>, msg: M) -> bool {
    match tx.try_send(msg) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::trace!("event queue full, dropping event");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Polls the terminal on a blocking thread and forwards events into the queue.
///
/// `Ctrl-C` cancels the session directly instead of being queued.
pub fn spawn_input<M, F>(
    tx: mpsc::Sender<M>,
    convert: F,
    shutdown: Shutdown,
    token: TaskToken,
) -> JoinHandle<()>
where
    M: Send + 'static,
    F: Fn(Event) -> Option<M> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _token = token;
        while !shutdown.is_cancelled() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    log::error!("polling terminal events: {err}");
                    shutdown.cancel();
                    break;
                }
            }
            let event = match event::read() {
                Ok(event) => event,
                Err(err) => {
                    log::error!("reading terminal event: {err}");
                    shutdown.cancel();
                    break;
                }
            };
            if let Event::Key(key) = &event {
                if keys::is_ctrl_c(key) {
                    log::info!("interrupted");
                    shutdown.cancel();
                    break;
                }
            }
            if let Some(msg) = convert(event) {
                forward(&tx, msg);
            }
        }
        log::debug!("input producer stopped");
    })
}

/// Runs `handler` over the queue until it quits, the queue closes or the
/// session is cancelled.
///
/// Each message is handled on its own task so a panicking handler cannot take
/// the consumer down silently: the terminal is restored through `restore` and
/// the panic is re-raised here. `after` runs once per handled message.
/// Returns `None` when cancellation interrupted a running handler.
pub async fn dispatch<H, F>(
    mut handler: H,
    rx: &mut mpsc::Receiver<H::Msg>,
    shutdown: &Shutdown,
    mut after: F,
    restore: fn(),
) -> anyhow::Result<Option<H>>
where
    H: Handler,
    F: FnMut(&mut H, Control) -> anyhow::Result<()>,
{
    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(Some(handler)),
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => return Ok(Some(handler)),
            },
        };

        let task = tokio::spawn(async move {
            let control = handler.handle(msg);
            (handler, control)
        });

        let (returned, control) = tokio::select! {
            biased;
            joined = task => match joined {
                Ok(pair) => pair,
                Err(err) if err.is_panic() => {
                    restore();
                    std::panic::resume_unwind(err.into_panic());
                }
                Err(err) => return Err(err.into()),
            },
            _ = shutdown.cancelled() => {
                log::debug!("cancelled while a handler was running");
                return Ok(None);
            }
        };
        handler = returned;

        if control == Control::Quit {
            shutdown.cancel();
            return Ok(Some(handler));
        }
        after(&mut handler, control)?;
    }
}

/// Dropping this stops the task it belongs to.
#[derive(Debug)]
pub struct StopHandle {
    _stop: oneshot::Sender<()>,
}

/// Sends `tick()` every `period`, best effort.
pub fn spawn_ticker<M, F>(
    tx: mpsc::Sender<M>,
    tick: F,
    period: Duration,
    shutdown: Shutdown,
    token: TaskToken,
) -> StopHandle
where
    M: Send + 'static,
    F: Fn() -> M + Send + 'static,
{
    let (stop, mut stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _token = token;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = &mut stopped => break,
                _ = interval.tick() => {
                    forward(&tx, tick());
                }
            }
        }
        log::trace!("ticker stopped");
    });
    StopHandle { _stop: stop }
}

/// Walks an autoplay schedule, sending `step(index)` after each delay.
///
/// Steps are awaited sends: unlike raw input they are never dropped.
pub fn spawn_autoplay<M, F>(
    tx: mpsc::Sender<M>,
    plan: Autoplay,
    step: F,
    shutdown: Shutdown,
    token: TaskToken,
) -> StopHandle
where
    M: Send + 'static,
    F: Fn(isize) -> M + Send + 'static,
{
    let (stop, mut stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _token = token;
        for scheduled in plan {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = &mut stopped => return,
                _ = tokio::time::sleep(scheduled.delay) => {}
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = &mut stopped => return,
                sent = tx.send(step(scheduled.index)) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
        log::debug!("autoplay finished");
    });
    StopHandle { _stop: stop }
}

/// Persists a finished game without blocking the caller.
///
/// A failed save is logged and cancels the session.
pub fn spawn_save(
    store: Arc<dyn GameStore>,
    record: GameRecord,
    shutdown: Shutdown,
    token: TaskToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _token = token;
        let id = record.info.id;
        match tokio::task::spawn_blocking(move || store.save(&record)).await {
            Ok(Ok(())) => log::info!("saved game {id}"),
            Ok(Err(err)) => {
                log::error!("saving game {id}: {err}");
                shutdown.cancel();
            }
            Err(err) => {
                log::error!("save task for game {id} failed: {err}");
                shutdown.cancel();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use termines_core::{History, OpenResult};
    use tokio::time::timeout;

    use super::*;
    use crate::store::MemoryStore;

    const LIMIT: Duration = Duration::from_secs(5);

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Vec<u32>,
    }

    impl Handler for Recorder {
        type Msg = u32;

        fn handle(&mut self, msg: u32) -> Control {
            match msg {
                0 => Control::Quit,
                13 => panic!("unlucky message"),
                _ => {
                    self.seen.push(msg);
                    Control::Redraw
                }
            }
        }
    }

    fn no_restore() {}

    #[test]
    fn full_queue_drops_newest() {
        let (tx, mut rx) = mpsc::channel(2);

        assert!(forward(&tx, 1));
        assert!(forward(&tx, 2));
        assert!(!forward(&tx, 3));

        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatches_in_arrival_order() {
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        for msg in 1..=5 {
            tx.send(msg).await.unwrap();
        }
        drop(tx);

        let shutdown = Shutdown::new();
        let mut calls = 0;
        let handler = dispatch(
            Recorder::default(),
            &mut rx,
            &shutdown,
            |_, control| {
                assert_eq!(control, Control::Redraw);
                calls += 1;
                Ok(())
            },
            no_restore,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(handler.seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls, 5);
        assert!(!shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn quit_cancels_the_session() {
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        tx.send(7).await.unwrap();
        tx.send(0).await.unwrap();
        tx.send(8).await.unwrap();

        let shutdown = Shutdown::new();
        let handler = dispatch(Recorder::default(), &mut rx, &shutdown, |_, _| Ok(()), no_restore)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(handler.seen, vec![7]);
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_stops_an_idle_consumer() {
        let (_tx, mut rx) = mpsc::channel::<u32>(QUEUE_CAPACITY);
        let shutdown = Shutdown::new();
        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = timeout(
            LIMIT,
            dispatch(Recorder::default(), &mut rx, &shutdown, |_, _| Ok(()), no_restore),
        )
        .await
        .unwrap();

        assert!(result.unwrap().is_some());
    }

    static RESTORED: AtomicBool = AtomicBool::new(false);

    fn mark_restored() {
        RESTORED.store(true, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn handler_panic_restores_then_propagates() {
        let joined = tokio::spawn(async {
            let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
            tx.send(1).await.unwrap();
            tx.send(13).await.unwrap();
            let shutdown = Shutdown::new();
            dispatch(Recorder::default(), &mut rx, &shutdown, |_, _| Ok(()), mark_restored).await
        })
        .await;

        let err = joined.unwrap_err();
        assert!(err.is_panic());
        assert!(RESTORED.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn tracker_waits_for_every_token() {
        let tracker = TaskTracker::new();
        let finished = Arc::new(AtomicBool::new(false));

        let token = tracker.token();
        let flag = finished.clone();
        tokio::spawn(async move {
            let _token = token;
            tokio::time::sleep(Duration::from_millis(30)).await;
            flag.store(true, Ordering::SeqCst);
        });

        timeout(LIMIT, tracker.wait()).await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn ticker_stops_when_handle_dropped() {
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        let tracker = TaskTracker::new();
        let handle = spawn_ticker(
            tx,
            || (),
            Duration::from_millis(10),
            Shutdown::new(),
            tracker.token(),
        );

        timeout(LIMIT, rx.recv()).await.unwrap().unwrap();
        drop(handle);

        // the sender lives in the task, so the queue closes once it exits
        timeout(LIMIT, async { while rx.recv().await.is_some() {} })
            .await
            .unwrap();
        timeout(LIMIT, tracker.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn autoplay_sends_every_step_in_order() {
        let mut history = History::new();
        history
            .record_open(Duration::ZERO, (0, 0), OpenResult::None)
            .unwrap();
        history.record_move(Duration::from_millis(5), (1, 0)).unwrap();
        history
            .record_open(Duration::from_millis(15), (1, 0), OpenResult::Lost)
            .unwrap();

        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        let plan = Autoplay::plan(&history, history.last_index());
        let _handle = spawn_autoplay(tx, plan, |index| index, Shutdown::new(), TaskTracker::new().token());

        let mut steps = Vec::new();
        timeout(LIMIT, async {
            while let Some(index) = rx.recv().await {
                steps.push(index);
            }
        })
        .await
        .unwrap();

        assert_eq!(steps, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn save_is_tracked_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        let record = crate::store::tests::record(true);
        let id = record.info.id;
        let tracker = TaskTracker::new();
        let shutdown = Shutdown::new();

        spawn_save(store.clone(), record, shutdown.clone(), tracker.token());
        timeout(LIMIT, tracker.wait()).await.unwrap();

        assert!(store.get(id).is_ok());
        assert!(!shutdown.is_cancelled());
    }
}
