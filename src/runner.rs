use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Error, Result};
use log::{error, info};

use crate::account::Account;
use crate::archive;
use crate::interrupt::StopSignal;
use crate::normalizer;
use crate::permalink;
use crate::retry::Backoff;
use crate::types::{RunReport, WritePolicy};

// The two fallible phases of a run, kept apart so the caller can tell a
// broken fetch from a broken archive write.
#[derive(Debug)]
pub enum RunError {
    Fetch(Error),
    Archive(Error),
}

pub struct Runner<'a> {
    pub account: &'a dyn Account,
    pub stop: &'a StopSignal,
    pub archive_file: PathBuf,
    pub policy: WritePolicy,
    pub dedupe_history: bool,
    pub base_url: String,
    pub request_delay: Duration,
}

impl Runner<'_> {
    // One pass: fetch everything, archive the permalinks, then clear the
    // bookmarks one by one. The archive write happens before the first
    // removal so an aborted pass can only leave bookmarks behind, never
    // drop their links.
    pub fn run_once(&self) -> Result<RunReport, RunError> {
        let mut backoff = Backoff::new(self.request_delay, self.stop);
        let raw = backoff
            .execute("fetch bookmarks", || self.account.fetch_bookmarks())
            .map_err(RunError::Fetch)?;

        let entries = normalizer::extract_entries(&raw);
        if entries.is_empty() {
            info!("No bookmarks found");
            return Ok(RunReport {
                entries,
                removed: 0,
                written: 0,
            });
        }
        info!("Fetched {} bookmarks", entries.len());

        let urls: Vec<String> = entries
            .iter()
            .map(|entry| permalink::status_url(&self.base_url, entry))
            .collect();
        let written = archive::merge_into(&self.archive_file, &urls, self.policy, self.dedupe_history)
            .with_context(|| format!("Could not update {}", self.archive_file.display()))
            .map_err(RunError::Archive)?;
        info!("Recorded {} links in {}", written, self.archive_file.display());

        let mut backoff = Backoff::new(self.request_delay, self.stop);
        let mut removed = 0;
        for (index, entry) in entries.iter().enumerate() {
            if self.stop.is_tripped() {
                info!("Stop requested, leaving the remaining bookmarks in place");
                break;
            }
            if index > 0 && !self.request_delay.is_zero() && !self.stop.pause(self.request_delay) {
                info!("Stop requested, leaving the remaining bookmarks in place");
                break;
            }

            let label = format!("remove bookmark {}", entry.id);
            let removal = backoff.execute(&label, || self.account.remove_bookmark(&entry.id));
            match removal {
                Ok(()) => {
                    removed += 1;
                    if removed % 10 == 0 {
                        info!("Removed {}/{} bookmarks", removed, entries.len());
                    }
                }
                Err(err) => {
                    error!("Could not remove bookmark {}: {err:#}", entry.id);
                }
            }
        }

        Ok(RunReport {
            entries,
            removed,
            written,
        })
    }
}
