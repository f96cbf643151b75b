//! Read-only-after-init configuration.

use crate::error::TagError;

/// Sentinel key distinguishing an unshared ("private") instance from any
/// valid shared key.
pub const PRIVATE_KEY: i32 = 0;

/// The three tunables reserved for a running service: descriptor namespace
/// size, maximum message size, and level count. All three are fixed for
/// the lifetime of a [`crate::TagEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagConfig {
    pub max_instances: usize,
    pub max_message_size: usize,
    pub levels: usize,
}

impl TagConfig {
    pub fn with_max_instances(mut self, n: usize) -> Self {
        self.max_instances = n;
        self
    }

    pub fn with_max_message_size(mut self, n: usize) -> Self {
        self.max_message_size = n;
        self
    }

    pub fn with_levels(mut self, n: usize) -> Self {
        self.levels = n;
        self
    }

    pub fn validate(&self) -> Result<(), TagError> {
        if self.max_instances == 0 || self.levels == 0 {
            return Err(TagError::Invalid);
        }
        Ok(())
    }
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            max_instances: 256,
            max_message_size: 4096,
            levels: 32,
        }
    }
}
