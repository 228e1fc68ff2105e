//! Capability descriptors for devices and filters.
//!
//! A [`Category`] is a small flag set. The chain engine intersects the
//! categories of every link to find what the pipeline as a whole can do,
//! and checks each pushed component against the chain's [`Mode`].

use std::fmt;

use crate::error::DeviceError;

/// Capability flags declared by a device or filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Category(u16);

impl Category {
    /// No capabilities.
    pub const NONE: Category = Category(0);
    /// Produces bytes.
    pub const INPUT: Category = Category(1 << 0);
    /// Consumes bytes.
    pub const OUTPUT: Category = Category(1 << 1);
    /// Independent read and write channels.
    pub const BIDIRECTIONAL: Category = Category(1 << 2);
    /// Single read/write head that can be repositioned.
    pub const SEEKABLE: Category = Category(1 << 3);
    /// Has a close operation the chain must call.
    pub const CLOSABLE: Category = Category(1 << 4);
    /// Filter usable for input or output, but one direction at a time.
    pub const DUAL_USE: Category = Category(1 << 5);
    /// Device accepts putback of the byte it last produced.
    pub const PEEKABLE: Category = Category(1 << 6);
    /// Device reports a preferred buffer size.
    pub const OPTIMALLY_BUFFERED: Category = Category(1 << 7);

    pub const SOURCE: Category = Self::INPUT;
    pub const SINK: Category = Self::OUTPUT;
    pub const BIDIRECTIONAL_DEVICE: Category = Self::INPUT
        .union(Self::OUTPUT)
        .union(Self::BIDIRECTIONAL);
    pub const SEEKABLE_DEVICE: Category = Self::INPUT.union(Self::OUTPUT).union(Self::SEEKABLE);

    pub const INPUT_FILTER: Category = Self::INPUT;
    pub const OUTPUT_FILTER: Category = Self::OUTPUT;
    pub const DUAL_USE_FILTER: Category = Self::INPUT.union(Self::OUTPUT).union(Self::DUAL_USE);
    pub const SEEKABLE_FILTER: Category = Self::INPUT.union(Self::OUTPUT).union(Self::SEEKABLE);
    pub const BIDIRECTIONAL_FILTER: Category = Self::BIDIRECTIONAL_DEVICE;

    const NAMES: [(Category, &'static str); 8] = [
        (Self::INPUT, "input"),
        (Self::OUTPUT, "output"),
        (Self::BIDIRECTIONAL, "bidirectional"),
        (Self::SEEKABLE, "seekable"),
        (Self::CLOSABLE, "closable"),
        (Self::DUAL_USE, "dual-use"),
        (Self::PEEKABLE, "peekable"),
        (Self::OPTIMALLY_BUFFERED, "optimally-buffered"),
    ];

    /// Raw flag bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Rebuild a category from raw bits, dropping unknown flags.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Category(bits & 0xff)
    }

    /// Union of two flag sets.
    pub const fn union(self, other: Category) -> Category {
        Category(self.0 | other.0)
    }

    /// Alias of [`union`](Self::union) that reads better when declaring categories.
    pub const fn with(self, other: Category) -> Category {
        self.union(other)
    }

    /// Flags present in both sets.
    pub const fn intersect(self, other: Category) -> Category {
        Category(self.0 & other.0)
    }

    /// True if every flag of `other` is present.
    pub const fn contains(self, other: Category) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_input(self) -> bool {
        self.contains(Self::INPUT)
    }

    pub const fn is_output(self) -> bool {
        self.contains(Self::OUTPUT)
    }

    pub const fn is_bidirectional(self) -> bool {
        self.contains(Self::BIDIRECTIONAL)
    }

    pub const fn is_seekable(self) -> bool {
        self.contains(Self::SEEKABLE)
    }

    pub const fn is_closable(self) -> bool {
        self.contains(Self::CLOSABLE)
    }

    pub const fn is_dual_use(self) -> bool {
        self.contains(Self::DUAL_USE)
    }

    pub const fn is_peekable(self) -> bool {
        self.contains(Self::PEEKABLE)
    }

    pub const fn is_optimally_buffered(self) -> bool {
        self.contains(Self::OPTIMALLY_BUFFERED)
    }

    /// Whether a component with this category can take part in a chain of `mode`.
    pub const fn supports(self, mode: Mode) -> bool {
        match mode {
            Mode::Input => self.is_input(),
            Mode::Output => self.is_output(),
            Mode::Bidirectional => self.is_bidirectional(),
            Mode::Seekable => self.is_seekable(),
        }
    }
}

impl std::ops::BitOr for Category {
    type Output = Category;

    fn bitor(self, rhs: Category) -> Category {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for Category {
    type Output = Category;

    fn bitand(self, rhs: Category) -> Category {
        self.intersect(rhs)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
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

/// The direction(s) a chain or stream operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Read-only pipeline.
    Input,
    /// Write-only pipeline.
    Output,
    /// Independent read and write channels.
    Bidirectional,
    /// Single random-access head shared by reads and writes.
    Seekable,
}

impl Mode {
    pub const fn is_readable(self) -> bool {
        !matches!(self, Mode::Output)
    }

    pub const fn is_writable(self) -> bool {
        !matches!(self, Mode::Input)
    }

    /// Pick the mode a stream built around a bare device should use.
    pub fn for_device(category: Category) -> Result<Mode, DeviceError> {
        if category.is_seekable() {
            Ok(Mode::Seekable)
        } else if category.is_bidirectional() {
            Ok(Mode::Bidirectional)
        } else if category.is_input() && !category.is_output() {
            Ok(Mode::Input)
        } else if category.is_output() && !category.is_input() {
            Ok(Mode::Output)
        } else {
            Err(DeviceError::Unsupported(
                "device category does not determine a stream mode",
            ))
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Input => "input",
            Mode::Output => "output",
            Mode::Bidirectional => "bidirectional",
            Mode::Seekable => "seekable",
        };
        f.write_str(name)
    }
}
