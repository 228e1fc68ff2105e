//! Which components get closed, and when.
//!
//! | Event                 | auto_close = true     | auto_close = false    |
//! |-----------------------|-----------------------|-----------------------|
//! | chain dropped         | close all, top-down   | nothing closed        |
//! | explicit `close()`    | close all             | close all             |
//! | `reset()`             | close all, then empty | close all, then empty |
//! | `pop()`               | close removed link    | removed link left open|
//! | device replaced       | close old device      | old device left open  |
//!
//! Auto-close only governs implicit closure; explicit calls always close.

/// Something that may require components to be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The chain (or the stream owning it) is being dropped.
    Drop,
    /// Explicit `close()`.
    Close,
    /// Explicit `reset()`.
    Reset,
    /// `pop()` removed the most recently pushed component.
    Pop,
    /// A device was pushed onto a chain that already had one.
    ReplaceDevice,
}

impl LifecycleEvent {
    /// True if the event was requested explicitly by the caller.
    pub const fn is_explicit(self) -> bool {
        matches!(self, LifecycleEvent::Close | LifecycleEvent::Reset)
    }
}

/// Whether `event` closes the affected components under the given auto-close flag.
pub const fn closes(event: LifecycleEvent, auto_close: bool) -> bool {
    event.is_explicit() || auto_close
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table() {
        use LifecycleEvent::*;

        let table = [
            (Drop, true, true),
            (Drop, false, false),
            (Close, true, true),
            (Close, false, true),
            (Reset, true, true),
            (Reset, false, true),
            (Pop, true, true),
            (Pop, false, false),
            (ReplaceDevice, true, true),
            (ReplaceDevice, false, false),
        ];
        for (event, auto_close, expected) in table {
            assert_eq!(
                closes(event, auto_close),
                expected,
                "{event:?} with auto_close={auto_close}"
            );
        }
    }
}
