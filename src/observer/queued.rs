//! Queued delivery: decouples observer cost from servo timing.
//!
//! A [`QueuedObserver`] is registered like any other observer, but its
//! methods only push into a bounded channel. The host drains the paired
//! [`EventReceiver`] on its own thread. A full queue drops the event and
//! counts it; the servo thread never waits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::Arc;

use glam::DVec3;
use web_time::Duration;

use super::HapticObserver;
use crate::input::HapticEvent;

/// Observer half of a queued pair. Lives in the registry.
pub struct QueuedObserver {
    tx: mpsc::SyncSender<HapticEvent>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half of a queued pair.
pub struct EventReceiver {
    rx: mpsc::Receiver<HapticEvent>,
    dropped: Arc<AtomicU64>,
}

/// Create a queued observer with room for `capacity` pending events.
#[must_use]
pub fn queued(capacity: usize) -> (QueuedObserver, EventReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        QueuedObserver {
            tx,
            dropped: Arc::clone(&dropped),
        },
        EventReceiver { rx, dropped },
    )
}

impl QueuedObserver {
    fn push(&self, event: HapticEvent) {
        // A disconnected receiver means nobody is listening; drop silently.
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl HapticObserver for QueuedObserver {
    fn on_move(&self, position: DVec3, azimuth: f64, elevation: f64, zoom: f64) {
        self.push(HapticEvent::Move {
            position,
            azimuth,
            elevation,
            zoom,
        });
    }

    fn on_first_button_down(&self) {
        self.push(HapticEvent::FirstButtonDown);
    }

    fn on_first_button_up(&self) {
        self.push(HapticEvent::FirstButtonUp);
    }

    fn on_second_button_down(&self, atom: Option<usize>) {
        self.push(HapticEvent::SecondButtonDown { atom });
    }

    fn on_second_button_up(&self) {
        self.push(HapticEvent::SecondButtonUp);
    }
}

impl EventReceiver {
    /// Next pending event, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<HapticEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<HapticEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// All pending events in delivery order.
    #[must_use]
    pub fn drain(&self) -> Vec<HapticEvent> {
        self.rx.try_iter().collect()
    }

    /// Pending events with intermediate moves collapsed.
    ///
    /// Every button event is kept in order; only the most recent move
    /// survives, at its own position in the sequence.
    #[must_use]
    pub fn drain_coalesced(&self) -> Vec<HapticEvent> {
        let mut out: Vec<HapticEvent> = Vec::new();
        for event in self.rx.try_iter() {
            if !event.is_button() {
                out.retain(HapticEvent::is_button);
            }
            out.push(event);
        }
        out
    }

    /// Number of events dropped because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: f64) -> HapticEvent {
        HapticEvent::Move {
            position: DVec3::new(x, 0.0, 0.0),
            azimuth: 0.0,
            elevation: 0.0,
            zoom: 1.0,
        }
    }

    #[test]
    fn events_arrive_in_order() {
        let (observer, rx) = queued(8);
        observer.on_first_button_down();
        observer.on_second_button_down(Some(3));
        observer.on_second_button_up();
        assert_eq!(
            rx.drain(),
            vec![
                HapticEvent::FirstButtonDown,
                HapticEvent::SecondButtonDown { atom: Some(3) },
                HapticEvent::SecondButtonUp,
            ]
        );
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (observer, rx) = queued(2);
        for _ in 0..5 {
            observer.on_first_button_down();
        }
        assert_eq!(rx.drain().len(), 2);
        assert_eq!(rx.dropped(), 3);
    }

    #[test]
    fn coalescing_keeps_buttons_and_latest_move() {
        let (observer, rx) = queued(16);
        observer.on_move(DVec3::new(1.0, 0.0, 0.0), 0.0, 0.0, 1.0);
        observer.on_first_button_down();
        observer.on_move(DVec3::new(2.0, 0.0, 0.0), 0.0, 0.0, 1.0);
        observer.on_move(DVec3::new(3.0, 0.0, 0.0), 0.0, 0.0, 1.0);
        observer.on_first_button_up();

        assert_eq!(
            rx.drain_coalesced(),
            vec![
                HapticEvent::FirstButtonDown,
                moved(3.0),
                HapticEvent::FirstButtonUp,
            ]
        );
    }

    #[test]
    fn disconnected_receiver_is_tolerated() {
        let (observer, rx) = queued(1);
        drop(rx);
        observer.on_first_button_down();
        observer.on_second_button_up();
    }

    #[test]
    fn recv_timeout_waits_for_another_thread() {
        let (observer, rx) = queued(4);
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)), None);

        let producer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            observer.on_second_button_down(None);
        });
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)),
            Some(HapticEvent::SecondButtonDown { atom: None })
        );
        producer.join().unwrap();
    }
}
