/// Default buffer size for device links.
pub const DEFAULT_DEVICE_BUFFER_SIZE: usize = 4096;

/// Default buffer size for filter links.
pub const DEFAULT_FILTER_BUFFER_SIZE: usize = 128;

/// Default number of bytes that can be pushed back on an input link.
pub const DEFAULT_PBACK_SIZE: usize = 4;

/// Pushback region is never smaller than this.
pub const MIN_PBACK_SIZE: usize = 4;

/// Controls buffering and close behavior of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChainConfig {
    /// Buffer size for device links unless the device or the push overrides it.
    pub device_buffer_size: usize,
    /// Buffer size for filter links unless the push overrides it.
    pub filter_buffer_size: usize,
    /// Pushback capacity of input buffers (raised to at least [`MIN_PBACK_SIZE`]).
    pub pback_size: usize,
    /// Close components implicitly on drop, pop and device replacement.
    pub auto_close: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            device_buffer_size: DEFAULT_DEVICE_BUFFER_SIZE,
            filter_buffer_size: DEFAULT_FILTER_BUFFER_SIZE,
            pback_size: DEFAULT_PBACK_SIZE,
            auto_close: true,
        }
    }
}

/// Per-push overrides. A buffer size of zero makes the link direct (unbuffered).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub buffer_size: Option<usize>,
    pub pback_size: Option<usize>,
}

impl PushOptions {
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    pub fn pback_size(mut self, size: usize) -> Self {
        self.pback_size = Some(size);
        self
    }

    /// Unbuffered link: every operation goes straight to the component.
    pub fn direct() -> Self {
        Self::default().buffer_size(0)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ChainConfig =
            serde_json::from_str(r#"{ "device_buffer_size": 16, "auto_close": false }"#).unwrap();
        assert_eq!(cfg.device_buffer_size, 16);
        assert_eq!(cfg.filter_buffer_size, DEFAULT_FILTER_BUFFER_SIZE);
        assert_eq!(cfg.pback_size, DEFAULT_PBACK_SIZE);
        assert!(!cfg.auto_close);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = ChainConfig {
            pback_size: 8,
            ..ChainConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
