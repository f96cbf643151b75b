//! Opaque operation-surface types.

/// `open`'s command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCommand {
    Open,
    Create,
}

/// `open`'s permission argument. `User` turns on the creator/root check
/// enforced by `receive`, `send`, and `control`; `All` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    All,
    User,
}

/// `control`'s command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    AwakeAll,
    Remove,
}

/// Caller identity passed to the permission predicate. Mirrors the
/// creator-uid-vs-caller-uid check the kernel module performs against
/// `current_uid()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub identity: u32,
    pub is_root: bool,
}

impl Credentials {
    pub fn root() -> Self {
        Credentials {
            identity: 0,
            is_root: true,
        }
    }

    pub fn user(identity: u32) -> Self {
        Credentials {
            identity,
            is_root: false,
        }
    }
}
