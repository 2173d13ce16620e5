use crate::config::ListenerConfig;
use crate::protocol;
use crate::types::{GazeSample, ListenerState};
use crate::{GazeError, Result};
use crossbeam_channel::{Receiver, TrySendError};
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{JoinHandle, ThreadId};

/// Consecutive hard receive failures after which the socket is considered dead.
pub const MAX_CONSECUTIVE_IO_ERRORS: u32 = 64;

/// Counts consecutive hard receive failures; any good receive resets it.
#[derive(Debug)]
struct IoErrorBudget {
    consecutive: u32,
    limit: u32,
}

impl IoErrorBudget {
    fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    fn on_ok(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failure. Returns true once the socket should be given up on.
    fn on_error(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive >= self.limit
    }
}

/// Subscriber invoked once per decoded sample, on the receive thread.
pub type GazeCallback = Arc<dyn Fn(&GazeSample) + Send + Sync>;

/// Counters maintained by the receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Datagrams received while running, valid or not.
    pub datagrams: u64,
    /// Samples handed to the subscriber without it panicking.
    pub delivered: u64,
    /// Datagrams that failed to decode.
    pub rejected: u64,
    /// Receive failures other than timeouts.
    pub io_errors: u64,
    /// Subscriber invocations that panicked.
    pub callback_failures: u64,
    /// Samples decoded while no subscriber was registered.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    datagrams: AtomicU64,
    delivered: AtomicU64,
    rejected: AtomicU64,
    io_errors: AtomicU64,
    callback_failures: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the listener handle and its receive thread.
struct Shared {
    state: AtomicU8,
    callback: Mutex<Option<GazeCallback>>,
    counters: Counters,
    rx_thread: OnceLock<ThreadId>,
}

impl Shared {
    fn state(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn is_running(&self) -> bool {
        self.state() == ListenerState::Running
    }

    fn on_rx_thread(&self) -> bool {
        self.rx_thread.get() == Some(&std::thread::current().id())
    }

    fn subscriber(&self) -> Option<GazeCallback> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hand one sample to the subscriber. The callback lock is released
    /// before invoking, so the subscriber may replace itself.
    fn dispatch(&self, sample: &GazeSample) {
        let Some(callback) = self.subscriber() else {
            Counters::bump(&self.counters.dropped);
            log::trace!("No gaze subscriber registered, dropping sample");
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| callback(sample))) {
            Ok(()) => Counters::bump(&self.counters.delivered),
            Err(payload) => {
                Counters::bump(&self.counters.callback_failures);
                let err = GazeError::CallbackFailure(panic_message(payload.as_ref()));
                log::error!("{}", err);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// UDP receiver for gaze datagrams.
///
/// One listener owns one socket and one background thread. Each datagram is
/// decoded and passed to the registered subscriber on that thread, in arrival
/// order, with no queueing in between. Malformed datagrams, receive errors and
/// panicking subscribers are logged and skipped; only [`stop`](Self::stop) (or
/// a socket that keeps failing) ends the loop.
///
/// Lifecycle: `Created -> Running -> Stopped`. `start` is only valid once;
/// `stop` is idempotent and is also run on drop.
pub struct GazeListener {
    config: ListenerConfig,
    shared: Arc<Shared>,
    local_addr: Mutex<Option<SocketAddr>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl GazeListener {
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: AtomicU8::new(ListenerState::Created as u8),
                callback: Mutex::new(None),
                counters: Counters::default(),
                rx_thread: OnceLock::new(),
            }),
            local_addr: Mutex::new(None),
            thread: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Register the subscriber, replacing any previous one.
    ///
    /// May be called before or after `start`. The callback runs on the
    /// receive thread; marshal to another thread yourself if needed.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&GazeSample) + Send + Sync + 'static,
    {
        *self.shared.callback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(callback));
    }

    /// Remove the subscriber. Samples decoded afterwards are dropped.
    pub fn clear_callback(&self) {
        *self.shared.callback.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Register a subscriber that forwards samples into a bounded channel.
    ///
    /// When the channel is full the newest sample is dropped; the receive
    /// loop never waits on the consumer.
    pub fn subscribe_channel(&self, capacity: usize) -> Receiver<GazeSample> {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        self.set_callback(move |sample| match sender.try_send(*sample) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::trace!("Gaze channel full, dropping sample");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("Gaze channel disconnected, dropping sample");
            }
        });
        receiver
    }

    /// Bind the socket and spawn the receive thread.
    ///
    /// Only valid from `Created`; otherwise returns `InvalidState`. If binding
    /// fails the listener stays in `Created`.
    pub fn start(&self) -> Result<()> {
        let mut thread = self.thread.lock().unwrap_or_else(PoisonError::into_inner);

        let state = self.shared.state();
        if state != ListenerState::Created {
            return Err(GazeError::InvalidState { op: "start", state });
        }

        let socket = UdpSocket::bind(self.config.socket_addr())?;
        socket.set_read_timeout(self.config.read_timeout)?;
        let local_addr = socket.local_addr()?;

        // stop() may have raced us while binding.
        if let Err(actual) = self.shared.state.compare_exchange(
            ListenerState::Created as u8,
            ListenerState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(GazeError::InvalidState {
                op: "start",
                state: ListenerState::from_u8(actual),
            });
        }

        let shared = self.shared.clone();
        let buffer_size = self.config.effective_buffer_size();
        let handle = std::thread::Builder::new()
            .name("gaze-udp-rx".into())
            .spawn(move || {
                receive_loop(socket, shared, buffer_size);
            })
            .map_err(|e| {
                let _ = self.shared.state.compare_exchange(
                    ListenerState::Running as u8,
                    ListenerState::Created as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                GazeError::ThreadSpawn(e.to_string())
            })?;

        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = Some(local_addr);
        *thread = Some(handle);

        // A stop() that landed after the CAS had no address to wake.
        if !self.shared.is_running() {
            self.wake();
        }

        log::info!("Gaze listener running on {}", local_addr);
        Ok(())
    }

    /// Stop the receive loop and release the socket.
    ///
    /// Safe to call any number of times and from any state. Once this returns
    /// the subscriber will not be invoked again. When called from inside the
    /// subscriber the thread cannot be joined; the current invocation finishes
    /// and the loop exits without dispatching further samples.
    pub fn stop(&self) {
        let previous = ListenerState::from_u8(
            self.shared
                .state
                .swap(ListenerState::Stopped as u8, Ordering::AcqRel),
        );

        match previous {
            ListenerState::Running => {
                log::info!("Gaze listener stopping");
                self.wake();
            }
            ListenerState::Created => {
                log::info!("Gaze listener stopped before start");
            }
            ListenerState::Stopped => {}
        }

        if self.shared.on_rx_thread() {
            return;
        }

        // Held across the join so concurrent callers also wait for the thread.
        let mut thread = self.thread.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = thread.take() {
            if handle.join().is_err() {
                log::error!("Gaze receive thread panicked");
            }
        }
    }

    /// Unblock a pending receive with an empty datagram to our own port.
    fn wake(&self) {
        let Some(addr) = self.local_addr() else {
            return;
        };
        let target = match addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => {
                SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
            }
            IpAddr::V6(ip) if ip.is_unspecified() => {
                SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
            }
            _ => addr,
        };
        let bind: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let sent = UdpSocket::bind(bind).and_then(|s| s.send_to(&[], target));
        if let Err(e) = sent {
            log::trace!("Gaze listener wake-up failed: {}", e);
        }
    }

    pub fn state(&self) -> ListenerState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Address the socket is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> ListenerStats {
        self.shared.counters.snapshot()
    }
}

impl Drop for GazeListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The receive loop runs in a dedicated thread and owns the socket;
/// the socket is closed when the loop returns.
fn receive_loop(socket: UdpSocket, shared: Arc<Shared>, buffer_size: usize) {
    let mut buf = vec![0u8; buffer_size];
    let mut budget = IoErrorBudget::new(MAX_CONSECUTIVE_IO_ERRORS);

    let _ = shared.rx_thread.set(std::thread::current().id());
    log::info!("Gaze receive loop started");

    loop {
        if !shared.is_running() {
            log::info!("Gaze receive loop stopping (state {:?})", shared.state());
            break;
        }

        let len = match socket.recv_from(&mut buf) {
            Ok((n, _peer)) => {
                budget.on_ok();
                n
            }
            // read timeout elapsed, go re-check the state
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                Counters::bump(&shared.counters.io_errors);
                log::warn!("{}", GazeError::Io(e));
                if budget.on_error() {
                    log::error!(
                        "Gaze socket failed {} times in a row, giving up",
                        budget.consecutive
                    );
                    shared
                        .state
                        .store(ListenerState::Stopped as u8, Ordering::Release);
                    break;
                }
                continue;
            }
        };

        // Stopped while blocked; this may be the wake-up datagram.
        if !shared.is_running() {
            log::info!("Gaze receive loop stopping (state {:?})", shared.state());
            break;
        }

        Counters::bump(&shared.counters.datagrams);

        match protocol::decode(&buf[..len]) {
            Ok(sample) => shared.dispatch(&sample),
            Err(e) => {
                Counters::bump(&shared.counters.rejected);
                log::warn!("Dropping gaze datagram: {}", e);
            }
        }
    }
}
