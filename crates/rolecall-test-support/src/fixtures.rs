//! On-disk configuration documents for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rolecall_config::{CommunityConfig, ConfigDocument, ConfigStore};
use tempfile::TempDir;

/// Community used by the sample document.
pub const COMMUNITY: &str = "guild-1";
/// Actor listed as an overlord in the sample document.
pub const OVERLORD: &str = "overlord-1";
/// Actor with no special standing.
pub const MEMBER: &str = "member-1";
/// Role already allowed in [`COMMUNITY`].
pub const ALLOWED_ROLE: &str = "scout";

/// Sample document: one overlord and [`COMMUNITY`] allowing [`ALLOWED_ROLE`].
#[must_use]
pub fn sample_document() -> ConfigDocument {
    let mut document = ConfigDocument::new("test-secret");
    document.overlords.push(OVERLORD.to_string());
    document
        .communities
        .insert(COMMUNITY.to_string(), CommunityConfig::with_roles([ALLOWED_ROLE]));
    document.faces.push("(o_o)".to_string());
    document
}

/// A document written into its own scratch directory.
pub struct DocumentFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl DocumentFixture {
    /// Write `document` as `config.json` in a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn new(document: &ConfigDocument) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("rolecall-test-")
            .tempdir()
            .context("failed to create fixture directory")?;
        let path = dir.path().join("config.json");
        let serialised =
            serde_json::to_string_pretty(document).context("failed to serialise fixture")?;
        fs::write(&path, serialised).context("failed to write fixture document")?;
        Ok(Self { _dir: dir, path })
    }

    /// Fixture holding [`sample_document`].
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be written.
    pub fn sample() -> Result<Self> {
        Self::new(&sample_document())
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a shared store over the fixture document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the document.
    pub async fn open_store(&self) -> Result<Arc<ConfigStore>> {
        let store = ConfigStore::open(&self.path)
            .await
            .context("failed to open fixture store")?;
        Ok(Arc::new(store))
    }

    /// Raw file contents, for byte-level comparisons.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn raw(&self) -> Result<String> {
        fs::read_to_string(&self.path).context("failed to read fixture document")
    }

    /// Parse the file as it currently exists on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn on_disk(&self) -> Result<ConfigDocument> {
        serde_json::from_str(&self.raw()?).context("failed to parse fixture document")
    }
}
