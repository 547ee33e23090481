//! Raw change events produced by the watch source
//!
//! Notify reports a rich, backend-specific event taxonomy. The governor only
//! cares about a handful of operation kinds, so events are collapsed into a
//! closed set here before they reach it.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event as NotifyEvent, EventKind};
use std::fmt;
use std::path::PathBuf;

/// Operation reported for a changed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// File contents were written
    Write,
    /// Path was created
    Create,
    /// Path was removed
    Remove,
    /// Permissions or other metadata changed
    ChmodPermission,
    /// Anything else (renames, access, backend-specific kinds)
    Other,
}

impl OperationKind {
    /// Whether events of this kind are considered by the governor at all
    pub fn is_relevant(self) -> bool {
        match self {
            Self::Write | Self::Create | Self::Remove | Self::ChmodPermission => true,
            Self::Other => false,
        }
    }
}

impl From<&EventKind> for OperationKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            EventKind::Remove(_) => Self::Remove,
            EventKind::Modify(ModifyKind::Metadata(_)) => Self::ChmodPermission,
            // The destination side of a rename is a new entry in the directory
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Self::Create,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Other,
            EventKind::Modify(_) => Self::Write,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Self::Other,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Write => "WRITE",
            Self::Create => "CREATE",
            Self::Remove => "REMOVE",
            Self::ChmodPermission => "CHMOD",
            Self::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// A single change notification for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: OperationKind,
    pub path: PathBuf,
}

impl RawEvent {
    pub fn new(kind: OperationKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Split a notify event into one raw event per affected path
    ///
    /// A paired rename carries `[from, to]`; the source path is reported as
    /// `Other` and the destination as `Create`.
    pub fn from_notify(event: &NotifyEvent) -> Vec<RawEvent> {
        let kind = OperationKind::from(&event.kind);
        let paired_rename = matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both))
        );

        event
            .paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let kind = if paired_rename && i == 1 {
                    OperationKind::Create
                } else {
                    kind
                };
                RawEvent::new(kind, path.clone())
            })
            .collect()
    }

    /// File name component of the changed path, for logging
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, RemoveKind};

    #[test]
    fn test_relevant_kinds() {
        assert!(OperationKind::Write.is_relevant());
        assert!(OperationKind::Create.is_relevant());
        assert!(OperationKind::Remove.is_relevant());
        assert!(OperationKind::ChmodPermission.is_relevant());
        assert!(!OperationKind::Other.is_relevant());
    }

    #[test]
    fn test_notify_kind_mapping() {
        let cases = [
            (EventKind::Create(CreateKind::File), OperationKind::Create),
            (EventKind::Remove(RemoveKind::Any), OperationKind::Remove),
            (
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                OperationKind::Write,
            ),
            (EventKind::Modify(ModifyKind::Any), OperationKind::Write),
            (
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                OperationKind::ChmodPermission,
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                OperationKind::Create,
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                OperationKind::Other,
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
                OperationKind::Other,
            ),
            (
                EventKind::Access(AccessKind::Close(AccessMode::Write)),
                OperationKind::Other,
            ),
            (EventKind::Any, OperationKind::Other),
            (EventKind::Other, OperationKind::Other),
        ];

        for (kind, expected) in cases {
            assert_eq!(OperationKind::from(&kind), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_from_notify_splits_paths() {
        let event = NotifyEvent::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/a.txt"))
            .add_path(PathBuf::from("/tmp/b.txt"));

        let raw = RawEvent::from_notify(&event);
        assert_eq!(
            raw,
            vec![
                RawEvent::new(OperationKind::Create, "/tmp/a.txt"),
                RawEvent::new(OperationKind::Create, "/tmp/b.txt"),
            ]
        );
    }

    #[test]
    fn test_from_notify_paired_rename() {
        let event = NotifyEvent::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/tmp/old.txt"))
            .add_path(PathBuf::from("/tmp/new.txt"));

        let raw = RawEvent::from_notify(&event);
        assert_eq!(
            raw,
            vec![
                RawEvent::new(OperationKind::Other, "/tmp/old.txt"),
                RawEvent::new(OperationKind::Create, "/tmp/new.txt"),
            ]
        );
    }

    #[test]
    fn test_from_notify_moved_in() {
        let event = NotifyEvent::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/tmp/arrived.txt"));

        let raw = RawEvent::from_notify(&event);
        assert_eq!(
            raw,
            vec![RawEvent::new(OperationKind::Create, "/tmp/arrived.txt")]
        );
    }

    #[test]
    fn test_file_name() {
        let event = RawEvent::new(OperationKind::Write, "/var/data/report.csv");
        assert_eq!(event.file_name(), "report.csv");
    }
}
