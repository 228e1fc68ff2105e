use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Status flags of a [`Stream`](crate::Stream).
///
/// The empty set means good. `FAIL` marks a recoverable failure (end of
/// input during an exact read, a misuse of the chain), `BAD` an I/O fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IoState(u8);

impl IoState {
    pub const GOOD: IoState = IoState(0);
    pub const EOF: IoState = IoState(1 << 0);
    pub const FAIL: IoState = IoState(1 << 1);
    pub const BAD: IoState = IoState(1 << 2);

    const NAMES: [(IoState, &'static str); 3] =
        [(Self::EOF, "eof"), (Self::FAIL, "fail"), (Self::BAD, "bad")];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: IoState) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag is set in both.
    pub const fn intersects(self, other: IoState) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_good(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: IoState) -> IoState {
        IoState(self.0 | other.0)
    }

    pub const fn without(self, other: IoState) -> IoState {
        IoState(self.0 & !other.0)
    }
}

impl BitOr for IoState {
    type Output = IoState;

    fn bitor(self, rhs: IoState) -> IoState {
        self.union(rhs)
    }
}

impl BitOrAssign for IoState {
    fn bitor_assign(&mut self, rhs: IoState) {
        *self = self.union(rhs);
    }
}

impl BitAnd for IoState {
    type Output = IoState;

    fn bitand(self, rhs: IoState) -> IoState {
        IoState(self.0 & rhs.0)
    }
}

impl fmt::Display for IoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_good() {
            return f.write_str("good");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
