//! Typed input events and the source boundary.
//!
//! Window-system initialization and event pumping live outside this crate;
//! the host pushes typed events through an [`EventSource`] and the run loop
//! drains it once per iteration.

use std::collections::VecDeque;
use std::sync::mpsc;

/// A keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character key (lowercased).
    Char(char),
    /// The space bar.
    Space,
    /// Return/Enter.
    Enter,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Any other key, by the host's scan code.
    Other(u32),
}

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
}

/// A typed input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A key was pressed.
    KeyDown(Key),
    /// A key was released.
    KeyUp(Key),
    /// A mouse button was pressed at window coordinates.
    MouseDown {
        /// Which button.
        button: MouseButton,
        /// X position in window coordinates.
        x: f64,
        /// Y position in window coordinates.
        y: f64,
    },
    /// A mouse button was released at window coordinates.
    MouseUp {
        /// Which button.
        button: MouseButton,
        /// X position in window coordinates.
        x: f64,
        /// Y position in window coordinates.
        y: f64,
    },
}

impl Event {
    /// True for any key-press event.
    pub fn is_key_down(&self) -> bool {
        matches!(self, Event::KeyDown(_))
    }

    /// True when this is a press of the given character key.
    pub fn is_char_down(&self, c: char) -> bool {
        matches!(self, Event::KeyDown(Key::Char(k)) if *k == c)
    }
}

/// Non-blocking source of input events.
pub trait EventSource {
    /// Drain every event that arrived since the last poll.
    fn poll(&mut self) -> Vec<Event>;
}

/// An in-memory event source fed by the test (or a scripted run).
#[derive(Debug, Default)]
pub struct QueuedSource {
    queue: VecDeque<Event>,
}

impl QueuedSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next poll.
    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }
}

impl EventSource for QueuedSource {
    fn poll(&mut self) -> Vec<Event> {
        self.queue.drain(..).collect()
    }
}

/// An event source fed from another thread through a channel; the host's
/// window loop holds the sender.
pub struct ChannelSource {
    rx: mpsc::Receiver<Event>,
}

impl ChannelSource {
    /// Create a channel-backed source and the sender to feed it.
    pub fn new() -> (mpsc::Sender<Event>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, ChannelSource { rx })
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_source_drains() {
        let mut source = QueuedSource::new();
        source.push(Event::KeyDown(Key::Char('y')));
        source.push(Event::KeyUp(Key::Char('y')));
        assert_eq!(source.poll().len(), 2);
        assert!(source.poll().is_empty());
    }

    #[test]
    fn test_channel_source() {
        let (tx, mut source) = ChannelSource::new();
        tx.send(Event::KeyDown(Key::Space)).unwrap();
        tx.send(Event::MouseDown {
            button: MouseButton::Left,
            x: 10.0,
            y: 20.0,
        })
        .unwrap();
        assert_eq!(source.poll().len(), 2);
        assert!(source.poll().is_empty());
    }

    #[test]
    fn test_event_predicates() {
        assert!(Event::KeyDown(Key::Char('y')).is_char_down('y'));
        assert!(!Event::KeyUp(Key::Char('y')).is_char_down('y'));
        assert!(!Event::KeyDown(Key::Char('n')).is_char_down('y'));
    }
}
