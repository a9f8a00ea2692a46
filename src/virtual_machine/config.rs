//! Runtime configuration.

use crate::virtual_machine::arena::DEFAULT_ARENA_BYTES;
use crate::warn;

/// Environment variable overriding the arena capacity in bytes.
pub const ARENA_BYTES_ENV: &str = "FLOWVM_ARENA_BYTES";

/// Settings shared by every evaluation an [`Evaluator`](super::evaluate::Evaluator) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Arena capacity in bytes, rounded down to whole words on allocation.
    pub arena_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            arena_bytes: DEFAULT_ARENA_BYTES,
        }
    }
}

impl RuntimeConfig {
    pub fn with_arena_bytes(arena_bytes: usize) -> Self {
        Self { arena_bytes }
    }

    /// Defaults overridden by [`ARENA_BYTES_ENV`] when it holds a valid byte count.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(ARENA_BYTES_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(bytes) => config.arena_bytes = bytes,
                Err(_) => warn!(
                    "ignoring {ARENA_BYTES_ENV}={raw:?}: not a byte count, using {}",
                    config.arena_bytes
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_ten_mebibytes() {
        assert_eq!(RuntimeConfig::default().arena_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn lookup_overrides_arena_bytes() {
        let config = RuntimeConfig::from_lookup(|key| {
            (key == ARENA_BYTES_ENV).then(|| " 4096 ".to_string())
        });
        assert_eq!(config.arena_bytes, 4096);
    }

    #[test]
    fn invalid_lookup_keeps_default() {
        let config = RuntimeConfig::from_lookup(|_| Some("lots".to_string()));
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn missing_lookup_keeps_default() {
        assert_eq!(RuntimeConfig::from_lookup(|_| None), RuntimeConfig::default());
    }
}
