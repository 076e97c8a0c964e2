//! Resolution of a standard selector into a config artifact on disk.
//!
//! Named standards map to template files found on a fixed search path.
//! Custom config text is content-addressed: the artifact name is derived
//! from the SHA-256 of the text, so identical submissions share one file.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::models::Standard;
use crate::settings::{absolute, AnalyzerSettings};
use crate::templates::template_file_name;

/// Hex characters of the content hash used in artifact names.
const HASH_PREFIX_LEN: usize = 16;

/// A config artifact ready to hand to the tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub path: PathBuf,
    /// SHA-256 hex of the artifact content; empty if it could not be read.
    pub hash: String,
}

/// Turns standards into config artifact paths.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    search_dirs: Vec<PathBuf>,
    cache_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(search_dirs: Vec<PathBuf>, cache_dir: PathBuf) -> Self {
        Self {
            search_dirs,
            cache_dir,
        }
    }

    /// Build a resolver with the default search path.
    ///
    /// Order: configured template dir, `./configs/templates`,
    /// `../configs/templates`, then relative to the executable. Relative
    /// entries are anchored at the current directory, since the resolved
    /// path is read by tools running inside the work area.
    pub fn from_settings(settings: &AnalyzerSettings) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = &settings.template_dir {
            dirs.push(dir.clone());
        }
        dirs.push(PathBuf::from("configs").join("templates"));
        dirs.push(PathBuf::from("..").join("configs").join("templates"));
        if let Some(exe_dir) = executable_dir() {
            dirs.push(exe_dir.join("..").join("configs").join("templates"));
        }
        let dirs = dirs.into_iter().map(absolute).collect();
        Self::new(dirs, settings.cache_dir())
    }

    /// Resolve a standard, writing custom text to the cache if needed.
    pub fn resolve(&self, standard: Standard, custom: Option<&str>) -> Result<ResolvedConfig> {
        match standard {
            Standard::Custom => {
                let text = custom.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
                    AnalysisError::Input("custom standard requires config content".to_string())
                })?;
                self.write_custom(text)
            }
            named => self.find_template(named),
        }
    }

    /// First existing template for a named standard.
    pub fn find_template(&self, standard: Standard) -> Result<ResolvedConfig> {
        let file_name = template_file_name(standard);
        let tried: Vec<PathBuf> = self.search_dirs.iter().map(|d| d.join(&file_name)).collect();

        match tried.iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(standard = %standard, path = %path.display(), "using template");
                Ok(ResolvedConfig {
                    hash: fs::read(path).map(|b| content_hash(&b)).unwrap_or_default(),
                    path: path.clone(),
                })
            }
            None => Err(AnalysisError::ConfigNotFound {
                name: standard.to_string(),
                tried,
            }),
        }
    }

    /// Write custom config text under its content-derived name.
    ///
    /// An existing artifact with that name is reused as is. Concurrent
    /// writers race on an atomic no-clobber rename, so a reader never sees
    /// a partially written file.
    pub fn write_custom(&self, text: &str) -> Result<ResolvedConfig> {
        let hash = content_hash(text.as_bytes());
        let path = self.cache_dir.join(custom_file_name(&hash));

        if path.is_file() {
            debug!(path = %path.display(), "reusing cached custom config");
            return Ok(ResolvedConfig { path, hash });
        }

        let write_err = |source: std::io::Error| AnalysisError::ConfigWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.cache_dir).map_err(write_err)?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.cache_dir).map_err(write_err)?;
        staged.write_all(text.as_bytes()).map_err(write_err)?;
        staged.flush().map_err(write_err)?;

        match staged.persist_noclobber(&path) {
            Ok(_) => debug!(path = %path.display(), "wrote custom config"),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "custom config written concurrently");
            }
            Err(e) => return Err(write_err(e.error)),
        }

        Ok(ResolvedConfig { path, hash })
    }
}

/// SHA-256 of `content` as lowercase hex.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

fn custom_file_name(hash: &str) -> String {
    format!("config-{}.yaml", &hash[..HASH_PREFIX_LEN.min(hash.len())])
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}
