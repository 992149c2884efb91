use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkEntry {
    pub id: String,
    pub author: Option<String>,
}

impl BookmarkEntry {
    pub fn new(id: impl Into<String>, author: Option<&str>) -> Self {
        BookmarkEntry {
            id: id.into(),
            author: author.map(str::to_string),
        }
    }
}

// The interactive "ask" mode is resolved before the merger sees it, so only
// the two real policies exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    Append,
    Prepend,
}

#[derive(Debug)]
pub struct RunReport {
    /// Full normalized entry list, newest first, including entries whose
    /// removal failed.
    pub entries: Vec<BookmarkEntry>,
    pub removed: usize,
    /// Lines actually written to the archive; differs from `entries.len()`
    /// only when history dedup is on.
    pub written: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Exhausted,
    SingleRun,
    Stalled,
    CeilingReached,
    FetchFailed,
    ArchiveFailed,
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Exhausted => "no bookmarks remaining",
            StopReason::SingleRun => "single run requested",
            StopReason::Stalled => "no bookmarks could be removed",
            StopReason::CeilingReached => "maximum run count reached",
            StopReason::FetchFailed => "bookmark fetch failed",
            StopReason::ArchiveFailed => "archive write failed",
            StopReason::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub total_saved: usize,
    pub total_removed: usize,
    pub runs: usize,
    pub stop: StopReason,
}
