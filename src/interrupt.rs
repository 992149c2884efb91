use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::retry::Waiter;

// Ctrl+C flips a flag and pokes a channel, so loops can poll is_tripped()
// between requests and long waits wake up early instead of running out the
// clock.
pub struct StopSignal {
    tripped: Arc<AtomicBool>,
    signals: Receiver<()>,
    _keepalive: Sender<()>,
}

impl StopSignal {
    pub fn install() -> Result<StopSignal> {
        let (tx, rx) = bounded(1);
        let tripped = Arc::new(AtomicBool::new(false));

        let flag = tripped.clone();
        let handler_tx = tx.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = handler_tx.try_send(());
        })
        .context("Could not install the interrupt handler")?;

        Ok(StopSignal {
            tripped,
            signals: rx,
            _keepalive: tx,
        })
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    // Returns false when the pause was cut short by an interrupt.
    pub fn pause(&self, duration: Duration) -> bool {
        if self.is_tripped() {
            return false;
        }
        match self.signals.recv_timeout(duration) {
            Ok(()) => false,
            Err(RecvTimeoutError::Timeout) => true,
            // We hold a sender ourselves, so the channel cannot disconnect.
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    #[cfg(test)]
    pub fn stub(tripped: bool) -> StopSignal {
        let (tx, rx) = bounded(1);
        StopSignal {
            tripped: Arc::new(AtomicBool::new(tripped)),
            signals: rx,
            _keepalive: tx,
        }
    }

    // Does exactly what the installed handler does.
    #[cfg(test)]
    pub fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
        let _ = self._keepalive.try_send(());
    }

    // Wakes the next pause without tripping the flag.
    #[cfg(test)]
    pub fn queue_signal(&self) {
        let _ = self._keepalive.try_send(());
    }
}

impl Waiter for StopSignal {
    fn wait(&self, duration: Duration) -> bool {
        self.pause(duration)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::StopSignal;

    #[test]
    fn it_is_untripped_by_default() {
        let signal = StopSignal::stub(false);
        assert!(!signal.is_tripped());
        assert!(signal.pause(Duration::ZERO));
    }

    #[test]
    fn it_refuses_to_pause_once_tripped() {
        let signal = StopSignal::stub(true);
        assert!(signal.is_tripped());
        assert!(!signal.pause(Duration::from_secs(30)));
    }

    #[test]
    fn it_cuts_the_pause_when_signalled() {
        let signal = StopSignal::stub(false);
        signal.queue_signal();

        assert!(!signal.pause(Duration::from_secs(30)));
    }

    #[test]
    fn it_trips_like_the_real_handler() {
        let signal = StopSignal::stub(false);
        signal.trip();

        assert!(signal.is_tripped());
        assert!(!signal.pause(Duration::from_secs(30)));
    }
}
