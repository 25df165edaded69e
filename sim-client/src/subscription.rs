//! Server tick notifications.
//!
//! Each subscription owns a dedicated connection and a worker thread that
//! reads one `Timestamp` per line and hands it to the registered callback.
//! The callback only fires while the subscription token is live, so a
//! subscriber can revoke it at any time without coordinating with the worker.

use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use crate::SimError;
use crate::protocol::{Connection, Endpoint, NoParams};
use crate::types::Timestamp;

const SUBSCRIBE_METHOD: &str = "subscribe_tick";

/// Non-owning view of a subscription's liveness.
#[derive(Debug, Clone)]
pub struct TickToken {
    active: Arc<AtomicBool>,
}

impl TickToken {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Cancellable registration of a tick callback. Dropping it cancels.
pub struct TickSubscription {
    token: TickToken,
    stream: Option<TcpStream>,
    worker: Option<JoinHandle<()>>,
}

impl TickSubscription {
    /// A subscription without a worker of its own. Whoever dispatches ticks
    /// must check the returned token before every call.
    pub fn detached() -> (Self, TickToken) {
        let token = TickToken {
            active: Arc::new(AtomicBool::new(true)),
        };
        let subscription = Self {
            token: token.clone(),
            stream: None,
            worker: None,
        };
        (subscription, token)
    }

    pub fn token(&self) -> TickToken {
        self.token.clone()
    }

    pub fn is_active(&self) -> bool {
        self.token.is_active()
    }

    /// Revoke the token, close the stream and wait for the worker to exit.
    /// After this returns the callback will not run again.
    pub fn cancel(&mut self) {
        if !self.token.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("tick worker panicked");
            }
        }
        debug!("tick subscription cancelled");
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub(crate) fn spawn<F>(endpoint: &Endpoint, callback: F) -> Result<TickSubscription, SimError>
where
    F: FnMut(Timestamp) + Send + 'static,
{
    let mut conn = Connection::open(endpoint)?;
    conn.call::<_, ()>(SUBSCRIBE_METHOD, NoParams {})?;
    // Ticks may be arbitrarily far apart (e.g. a paused simulator).
    conn.set_read_timeout(None)?;
    let stream = conn.try_clone_stream()?;

    let (mut subscription, token) = TickSubscription::detached();
    let worker = thread::Builder::new()
        .name("sim-tick".to_string())
        .spawn(move || run_loop(conn, &token, callback))?;
    subscription.stream = Some(stream);
    subscription.worker = Some(worker);
    debug!(address = %endpoint.address, "subscribed to server ticks");
    Ok(subscription)
}

fn run_loop<F>(mut conn: Connection, token: &TickToken, mut callback: F)
where
    F: FnMut(Timestamp),
{
    loop {
        match conn.read_frame::<Timestamp>(SUBSCRIBE_METHOD) {
            Ok(Some(timestamp)) => {
                if !token.is_active() {
                    break;
                }
                trace!(frame = timestamp.frame, "server tick");
                callback(timestamp);
            }
            Ok(None) => {
                debug!("tick stream closed by simulator");
                break;
            }
            Err(err) => {
                if token.is_active() {
                    warn!(error = %err, "tick stream failed");
                }
                break;
            }
        }
    }
}
