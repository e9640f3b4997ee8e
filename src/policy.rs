//! Write policies for the write-through step.

/// Controls how the backing file is rewritten after each mutation.
///
/// Either way the whole map is written on every mutation; the policy only
/// decides what a crash in the middle of that write can leave behind.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Write to a temp file next to the target, then rename it over the
    /// target. A crash leaves either the old or the new document.
    #[default]
    Atomic,
    /// Truncate and overwrite the target directly. Fewer syscalls, but a crash
    /// mid-write can leave a torn file.
    InPlace,
}
