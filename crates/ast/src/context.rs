//! Per-run decompilation settings.

use gmdc_common::FormatVersion;

/// First `major.minor` with native multi-dimensional array indices.
pub const MULTI_DIMENSIONAL_ARRAYS_SINCE: (u32, u32) = (2, 3);

/// Row stride of flattened two-dimensional array indices in older formats.
pub const LEGACY_ARRAY_STRIDE: i32 = 32000;

/// Child count of an If statement that has both ternary values attached.
pub const TERNARY_CHILD_COUNT: usize = 5;

/// Settings shared by every block of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecompileContext {
    version: FormatVersion,
}

impl DecompileContext {
    pub fn new(version: FormatVersion) -> Self {
        Self { version }
    }

    /// Format version of the data file the function came from.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// True if array accesses encode two dimensions in a single index.
    pub fn uses_legacy_arrays(&self) -> bool {
        let (major, minor) = MULTI_DIMENSIONAL_ARRAYS_SINCE;
        !self.version.is_at_least(major, minor)
    }

    /// True if a postfix increment may be preceded by `dup.v` and a
    /// stack-permuting `pop.e.v`. Newer formats emit a different sequence.
    pub fn supports_postfix_swap_window(&self) -> bool {
        self.uses_legacy_arrays()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_before_2_3() {
        let ctx = DecompileContext::new(FormatVersion::new(2, 2, 2, 302));
        assert!(ctx.uses_legacy_arrays());
        assert!(ctx.supports_postfix_swap_window());
    }

    #[test]
    fn modern_from_2_3() {
        let ctx = DecompileContext::new(FormatVersion::new(2, 3, 0, 0));
        assert!(!ctx.uses_legacy_arrays());
        assert!(!ctx.supports_postfix_swap_window());
        let ctx = DecompileContext::new(FormatVersion::new(2022, 1, 0, 0));
        assert!(!ctx.uses_legacy_arrays());
    }

    #[test]
    fn version_accessor() {
        let v = FormatVersion::new(1, 4, 1804, 0);
        assert_eq!(DecompileContext::new(v).version(), v);
    }
}
