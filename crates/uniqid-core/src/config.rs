//! Registry configuration

/// Marker placed in front of the serial when a dead token's name is
/// printed with checking bypassed.
pub const DEFAULT_STALE_MARKER: char = '~';

/// Family registry configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Inserted between label and serial for dead tokens
    pub stale_marker: char,
    /// Forward lifecycle events to the registry's sink
    pub report_lifecycle: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            stale_marker: DEFAULT_STALE_MARKER,
            report_lifecycle: true,
        }
    }
}

impl RegistryConfig {
    /// Configuration that never reports lifecycle events.
    pub fn quiet() -> Self {
        RegistryConfig {
            report_lifecycle: false,
            ..Default::default()
        }
    }

    pub fn with_stale_marker(mut self, marker: char) -> Self {
        self.stale_marker = marker;
        self
    }
}
