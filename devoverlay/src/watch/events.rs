//! Classification of raw notify events.

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// What a filesystem event means to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// An entry appeared (created, or renamed into place).
    Created,
    /// An existing entry's content changed.
    Modified,
}

/// Which event kinds the loop acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchInterest {
    /// Also act on content modifications, not just creations.
    pub modifications: bool,
}

impl WatchInterest {
    /// Creation events only.
    pub const CREATIONS: Self = Self {
        modifications: false,
    };

    /// Creation and modification events.
    pub const CREATIONS_AND_MODIFICATIONS: Self = Self {
        modifications: true,
    };

    /// Interest implied by a touch pattern being configured or not.
    ///
    /// Modifications only matter for catching in-place archive edits, which
    /// only get forwarded when archives can be touched at all.
    pub fn for_touch_pattern(configured: bool) -> Self {
        if configured {
            Self::CREATIONS_AND_MODIFICATIONS
        } else {
            Self::CREATIONS
        }
    }

    /// Classify an event kind, returning `None` for events to ignore.
    ///
    /// Metadata-only modifications are never reported; touching a root
    /// produces exactly such an event.
    pub fn classify(&self, kind: &EventKind) -> Option<WatchEventKind> {
        match kind {
            EventKind::Create(_) => Some(WatchEventKind::Created),
            EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both)) => {
                Some(WatchEventKind::Created)
            }
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) if self.modifications => {
                Some(WatchEventKind::Modified)
            }
            _ => None,
        }
    }
}

impl Default for WatchInterest {
    fn default() -> Self {
        Self::CREATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    #[test]
    fn test_creations_always_classified() {
        for interest in [
            WatchInterest::CREATIONS,
            WatchInterest::CREATIONS_AND_MODIFICATIONS,
        ] {
            assert_eq!(
                interest.classify(&EventKind::Create(CreateKind::File)),
                Some(WatchEventKind::Created)
            );
            assert_eq!(
                interest.classify(&EventKind::Create(CreateKind::Folder)),
                Some(WatchEventKind::Created)
            );
            assert_eq!(
                interest.classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
                Some(WatchEventKind::Created)
            );
        }
    }

    #[test]
    fn test_modifications_follow_interest() {
        let data = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert_eq!(WatchInterest::CREATIONS.classify(&data), None);
        assert_eq!(
            WatchInterest::CREATIONS_AND_MODIFICATIONS.classify(&data),
            Some(WatchEventKind::Modified)
        );
    }

    #[test]
    fn test_ignored_kinds() {
        let interest = WatchInterest::CREATIONS_AND_MODIFICATIONS;
        let ignored = [
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Remove(RemoveKind::Folder),
            EventKind::Access(AccessKind::Any),
            EventKind::Other,
        ];
        for kind in ignored {
            assert_eq!(interest.classify(&kind), None, "{:?}", kind);
        }
    }

    #[test]
    fn test_interest_for_touch_pattern() {
        assert!(WatchInterest::for_touch_pattern(true).modifications);
        assert!(!WatchInterest::for_touch_pattern(false).modifications);
        assert_eq!(WatchInterest::default(), WatchInterest::CREATIONS);
    }
}
