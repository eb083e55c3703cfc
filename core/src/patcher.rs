//! # Target File Patching
//!
//! Applies an [`EndpointPattern`] to one file on disk. Every failure is
//! folded into a [`PatchResult`] so a batch never stops on a single file.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use ipsync_common::network::Address;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{debug, warn};

use crate::pattern::EndpointPattern;

#[derive(Debug)]
pub enum PatchResult {
    /// The file was rewritten (or would be, in a dry run).
    Updated { replacements: usize },
    /// Nothing to change; the file was not touched.
    Unchanged,
    NotFound,
    ReadError(io::Error),
    WriteError(io::Error),
}

impl PatchResult {
    /// `Updated` and `Unchanged` both mean the file was handled.
    pub fn is_processed(&self) -> bool {
        matches!(self, PatchResult::Updated { .. } | PatchResult::Unchanged)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_processed()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PatchResult::Updated { .. } => "updated",
            PatchResult::Unchanged => "unchanged",
            PatchResult::NotFound => "not-found",
            PatchResult::ReadError(_) => "read-error",
            PatchResult::WriteError(_) => "write-error",
        }
    }

    pub fn cause(&self) -> Option<&io::Error> {
        match self {
            PatchResult::ReadError(e) | PatchResult::WriteError(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Updated { replacements: 1 } => write!(f, "Updated (1 endpoint)"),
            PatchResult::Updated { replacements } => {
                write!(f, "Updated ({replacements} endpoints)")
            }
            PatchResult::Unchanged => write!(f, "Unchanged"),
            PatchResult::NotFound => write!(f, "File not found"),
            PatchResult::ReadError(e) => write!(f, "Error reading file: {e}"),
            PatchResult::WriteError(e) => write!(f, "Error writing file: {e}"),
        }
    }
}

impl Serialize for PatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PatchResult", 3)?;
        state.serialize_field("status", self.kind())?;
        match self {
            PatchResult::Updated { replacements } => {
                state.serialize_field("replacements", replacements)?
            }
            _ => state.skip_field("replacements")?,
        }
        match self.cause() {
            Some(e) => state.serialize_field("error", &e.to_string())?,
            None => state.skip_field("error")?,
        }
        state.end()
    }
}

type WriteFn = fn(&Path, &[u8]) -> io::Result<()>;

fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

#[derive(Debug, Clone, Copy)]
pub struct FilePatcher {
    pattern: EndpointPattern,
    dry_run: bool,
    write: WriteFn,
}

impl FilePatcher {
    pub fn new(pattern: EndpointPattern) -> Self {
        Self {
            pattern,
            dry_run: false,
            write: write_file,
        }
    }

    #[cfg(test)]
    fn with_writer(mut self, write: WriteFn) -> Self {
        self.write = write;
        self
    }

    /// Reports what would change without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn apply(&self, path: &Path, address: Address) -> PatchResult {
        if !path.is_file() {
            warn!("File not found: {}", path.display());
            return PatchResult::NotFound;
        }

        let original = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Error reading {}: {e}", path.display());
                return PatchResult::ReadError(e);
            }
        };

        let rewrite = self.pattern.apply(&original, address);
        if rewrite.is_unchanged() {
            debug!("{} already points at {address}", path.display());
            return PatchResult::Unchanged;
        }

        if self.dry_run {
            debug!("Dry run, leaving {} untouched", path.display());
        } else if let Err(e) = (self.write)(path, rewrite.text.as_bytes()) {
            warn!("Error writing {}: {e}", path.display());
            return PatchResult::WriteError(e);
        }

        PatchResult::Updated {
            replacements: rewrite.replacements,
        }
    }
}
