//! Error types shared across the crate.

use dicom::core::{Tag, VR};
use dicom::object::{ReadError, WriteError};
use thiserror::Error;

use crate::model::NodePath;

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The codec rejected the input byte stream.
    #[error("failed to decode DICOM stream")]
    Decode(#[from] ReadError),

    /// The codec rejected the dataset while writing it back out.
    #[error("failed to encode DICOM dataset")]
    Encode(#[from] WriteError),

    /// A decoded element's declared representation disagrees with the
    /// shape of its value. The file cannot be opened.
    #[error("malformed structure at {tag}: {detail}")]
    MalformedStructure { tag: Tag, detail: String },

    /// A path handle no longer resolves against the current tree.
    #[error("no element at path {path}")]
    PathNotFound { path: NodePath },

    /// A staged value does not conform to the target element's VR.
    /// Recoverable; nothing was changed.
    #[error("invalid value for {} ({}): {}", .tag, .vr.to_string(), .detail)]
    InvalidValue { tag: Tag, vr: VR, detail: String },

    /// One or more staged edits failed tree-wide validation at commit
    /// time. The tree and the ledger are left as they were.
    #[error("commit rejected: {} staged edit(s) failed validation", .failures.len())]
    CommitValidation { failures: Vec<CommitFailure> },

    /// An operation was invoked while no file is open.
    #[error("no file is open in this session")]
    SessionClosed,
}

/// A single rejected edit from a failed commit, naming the element the
/// user has to revisit.
#[derive(Debug, Clone)]
pub struct CommitFailure {
    pub tag: Tag,
    pub vr: VR,
    pub detail: String,
}

impl std::fmt::Display for CommitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.tag, self.vr.to_string(), self.detail)
    }
}
