//! Naming defaults for files written next to the configuration document.

/// Prefix applied to temporary files created during atomic replacement.
#[allow(clippy::redundant_pub_crate)]
pub(crate) const TEMP_FILE_PREFIX: &str = ".rolecall-";
/// Suffix applied to temporary files created during atomic replacement.
#[allow(clippy::redundant_pub_crate)]
pub(crate) const TEMP_FILE_SUFFIX: &str = ".tmp";
