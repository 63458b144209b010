//! Option flag sets for transfer operations
//!
//! This module provides the type-safe flag sets that shape a copy or a move.
//! Exactly one of the two sets applies to a given transfer; the `Operation`
//! enum in `types` enforces that pairing.

// Serde is imported conditionally through cfg_attr

/// Flags controlling a copy operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyOptions {
    /// Fail when the destination entry already exists instead of overwriting it
    pub fail_if_exists: bool,
    /// Recreate symbolic links at the destination instead of copying their targets
    pub copy_symbolic_link: bool,
    /// Hint that the backend should bypass its write cache where it can
    ///
    /// Backends without an unbuffered path accept and ignore the hint.
    pub no_buffering: bool,
}

impl CopyOptions {
    /// Create copy options with every flag cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when the destination entry already exists
    pub fn with_fail_if_exists(mut self, fail_if_exists: bool) -> Self {
        self.fail_if_exists = fail_if_exists;
        self
    }

    /// Recreate symbolic links instead of copying their targets
    pub fn with_copy_symbolic_link(mut self, copy_symbolic_link: bool) -> Self {
        self.copy_symbolic_link = copy_symbolic_link;
        self
    }

    /// Hint that writes should bypass the backend cache
    pub fn with_no_buffering(mut self, no_buffering: bool) -> Self {
        self.no_buffering = no_buffering;
        self
    }
}

/// Flags controlling a move operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveOptions {
    /// Replace an existing destination entry
    ///
    /// For a directory destination the engine pre-deletes the target tree,
    /// because no native move primitive can replace a directory in place.
    pub replace_existing: bool,
    /// Permit copy-and-delete emulation when the move crosses volumes
    pub copy_allowed: bool,
    /// Defer the move until the system next restarts
    ///
    /// Mutually exclusive with `copy_allowed`; suppresses the
    /// replace-existing pre-deletion since nothing moves now.
    pub delay_until_reboot: bool,
    /// Flush the moved data to disk before the operation reports success
    pub write_through: bool,
}

impl MoveOptions {
    /// Create move options with every flag cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an existing destination entry
    pub fn with_replace_existing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }

    /// Permit copy-and-delete emulation across volumes
    pub fn with_copy_allowed(mut self, copy_allowed: bool) -> Self {
        self.copy_allowed = copy_allowed;
        self
    }

    /// Defer the move until the system next restarts
    pub fn with_delay_until_reboot(mut self, delay_until_reboot: bool) -> Self {
        self.delay_until_reboot = delay_until_reboot;
        self
    }

    /// Flush the moved data before reporting success
    pub fn with_write_through(mut self, write_through: bool) -> Self {
        self.write_through = write_through;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_options_default_is_permissive() {
        let options = CopyOptions::default();

        assert!(!options.fail_if_exists);
        assert!(!options.copy_symbolic_link);
        assert!(!options.no_buffering);
    }

    #[test]
    fn test_copy_options_builder() {
        let options = CopyOptions::new()
            .with_fail_if_exists(true)
            .with_copy_symbolic_link(true);

        assert!(options.fail_if_exists);
        assert!(options.copy_symbolic_link);
        assert!(!options.no_buffering);
    }

    #[test]
    fn test_move_options_builder() {
        let options = MoveOptions::new()
            .with_replace_existing(true)
            .with_copy_allowed(true)
            .with_write_through(true);

        assert!(options.replace_existing);
        assert!(options.copy_allowed);
        assert!(!options.delay_until_reboot);
        assert!(options.write_through);
    }
}
