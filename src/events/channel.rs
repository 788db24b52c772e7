//! Event channel implementation using crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the engine.
///
/// Cloneable; a dropped receiver turns every send into a no-op.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event, discarding it if nobody is listening
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events on the front-end side
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Iterate until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone.
///
/// Used by the plain (non-`_with_events`) engine entry points.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EngineEvent, EnginePhase, UndoEvent};
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Undo(UndoEvent::Completed {
                restored: 4,
                failed: 1,
            }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Undo(UndoEvent::Completed { restored, failed }) => {
                assert_eq!(restored, 4);
                assert_eq!(failed, 1);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Engine(EngineEvent::PhaseChanged {
            phase: EnginePhase::Scanning,
        }));
    }

    #[test]
    fn receiver_iteration_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Engine(EngineEvent::PhaseChanged {
            phase: EnginePhase::Grouping,
        }));
        drop(sender);

        assert_eq!(receiver.iter().count(), 1);
    }
}
