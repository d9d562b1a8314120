use serde::Serialize;

use crate::types::{UploadEvent, WorkflowArgument};

/// Why an upload event was dropped before triggering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyPath,
    DirectoryMarker,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyPath => f.write_str("empty object path"),
            SkipReason::DirectoryMarker => f.write_str("directory marker"),
        }
    }
}

/// Result of filtering one upload event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Start exactly one workflow instance with this argument.
    Start(WorkflowArgument),
    /// Drop the event without any downstream call.
    Skip(SkipReason),
}

/// Applies the directory/empty-path filter.
///
/// A path ending in `/` is a folder placeholder, not a file.
pub fn skip_reason(event: &UploadEvent) -> Option<SkipReason> {
    if event.object_path.is_empty() {
        Some(SkipReason::EmptyPath)
    } else if event.object_path.ends_with('/') {
        Some(SkipReason::DirectoryMarker)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_marker_is_skipped() {
        let event = UploadEvent::new("b", "folder/");
        assert_eq!(skip_reason(&event), Some(SkipReason::DirectoryMarker));
    }

    #[test]
    fn empty_path_is_skipped() {
        let event = UploadEvent::new("b", "");
        assert_eq!(skip_reason(&event), Some(SkipReason::EmptyPath));
    }

    #[test]
    fn nested_file_is_kept() {
        let event = UploadEvent::new("b", "folder/a.txt");
        assert_eq!(skip_reason(&event), None);
    }
}
