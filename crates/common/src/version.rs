//! Bytecode format version.

use std::fmt;

/// Version of the runtime that produced a data file.
///
/// Several encodings changed in 2.3 (native multi-dimensional arrays,
/// new stack-move forms), so the decompiler gates legacy behavior on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub release: u32,
    pub build: u32,
}

impl FormatVersion {
    pub fn new(major: u32, minor: u32, release: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            release,
            build,
        }
    }

    /// True if `major.minor` is at least the given pair.
    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.release, self.build
        )
    }
}
