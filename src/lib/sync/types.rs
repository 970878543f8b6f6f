use std::{io, path::PathBuf};

use thiserror::Error;

use crate::lib::template::types::Template;

/// Writes and removes the mirrored file for one container.
#[derive(Debug, Clone)]
pub struct FileSync {
    pub label: String,
    pub filename_template: Template,
    pub end_with_newline: bool,
}

/// Outcome of a removal. A missing file is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    AlreadyAbsent,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("container has no {label:?} label to mirror")]
    MissingPayload { label: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;
