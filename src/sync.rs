use std::time::Duration;

use anyhow::Result;
use log::{error, info};

use crate::interrupt::StopSignal;
use crate::runner::{RunError, Runner};
use crate::types::{StopReason, SyncReport};

// Drives run_once() until the account is drained or something tells us to
// stop. Every exit path carries the totals accumulated so far.
pub fn synchronize(
    runner: &Runner,
    stop: &StopSignal,
    single_run: bool,
    max_runs: usize,
    run_delay: Duration,
) -> Result<SyncReport> {
    let mut total_saved = 0;
    let mut total_removed = 0;
    let mut runs = 0;

    let reason = loop {
        if stop.is_tripped() {
            break StopReason::Interrupted;
        }

        info!("Starting run {}", runs + 1);
        let run = match runner.run_once() {
            Ok(run) => run,
            Err(run_error) => {
                // A Ctrl+C cuts backoff waits short and surfaces as a failed
                // operation; report the interrupt, not the failure.
                if stop.is_tripped() {
                    break StopReason::Interrupted;
                }
                match run_error {
                    RunError::Fetch(err) => {
                        if runs == 0 {
                            // Nothing has been accomplished yet, so a broken
                            // first run is a hard error rather than a partial
                            // result.
                            return Err(err);
                        }
                        error!("Bookmark fetch failed: {err:#}");
                        break StopReason::FetchFailed;
                    }
                    RunError::Archive(err) => {
                        if runs == 0 {
                            return Err(err);
                        }
                        error!("Archive write failed: {err:#}");
                        break StopReason::ArchiveFailed;
                    }
                }
            }
        };
        runs += 1;

        if run.entries.is_empty() {
            break StopReason::Exhausted;
        }

        total_saved += run.written;
        total_removed += run.removed;

        if stop.is_tripped() {
            break StopReason::Interrupted;
        }
        if single_run {
            break StopReason::SingleRun;
        }
        if run.removed == 0 {
            break StopReason::Stalled;
        }
        if runs >= max_runs {
            break StopReason::CeilingReached;
        }
        if !stop.pause(run_delay) {
            break StopReason::Interrupted;
        }
    };

    Ok(SyncReport {
        total_saved,
        total_removed,
        runs,
        stop: reason,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use serde_json::{json, Value};

    use super::synchronize;
    use crate::account::Account;
    use crate::interrupt::StopSignal;
    use crate::runner::Runner;
    use crate::types::{StopReason, WritePolicy};

    // Serves one scripted fetch result per call; an exhausted script fails
    // the fetch. Removals succeed unless reject_removals is set. The hooks
    // fire on every call and let a test trip the stop signal or break the
    // archive in the middle of a run.
    struct ScriptedAccount<'a> {
        fetches: RefCell<VecDeque<Result<Value>>>,
        reject_removals: bool,
        fetch_calls: RefCell<usize>,
        on_fetch: Option<Box<dyn Fn() + 'a>>,
        on_removal: Option<Box<dyn Fn() + 'a>>,
    }

    impl<'a> ScriptedAccount<'a> {
        fn new(fetches: Vec<Result<Value>>) -> ScriptedAccount<'a> {
            ScriptedAccount {
                fetches: RefCell::new(fetches.into()),
                reject_removals: false,
                fetch_calls: RefCell::new(0),
                on_fetch: None,
                on_removal: None,
            }
        }
    }

    impl Account for ScriptedAccount<'_> {
        fn fetch_bookmarks(&self) -> Result<Value> {
            *self.fetch_calls.borrow_mut() += 1;
            if let Some(hook) = &self.on_fetch {
                hook();
            }
            self.fetches
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("script ran dry")))
        }

        fn remove_bookmark(&self, _id: &str) -> Result<()> {
            if let Some(hook) = &self.on_removal {
                hook();
            }
            if self.reject_removals {
                return Err(anyhow!("removal rejected"));
            }
            Ok(())
        }
    }

    fn bookmarks(ids: &[&str]) -> Value {
        let items: Vec<Value> = ids.iter().map(|id| json!({ "id_str": id })).collect();
        Value::Array(items)
    }

    fn runner<'a>(account: &'a ScriptedAccount<'a>, stop: &'a StopSignal, archive: PathBuf) -> Runner<'a> {
        Runner {
            account,
            stop,
            archive_file: archive,
            policy: WritePolicy::Append,
            dedupe_history: false,
            base_url: "https://twitter.com".to_string(),
            request_delay: Duration::ZERO,
        }
    }

    #[test]
    fn it_loops_until_the_account_is_drained() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![
            Ok(bookmarks(&["100", "200"])),
            Ok(bookmarks(&["300"])),
            Ok(bookmarks(&[])),
        ]);
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.runs, 3);
        assert_eq!(report.total_saved, 3);
        assert_eq!(report.total_removed, 3);
    }

    #[test]
    fn it_stops_after_one_pass_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![Ok(bookmarks(&["100"]))]);
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, true, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::SingleRun);
        assert_eq!(report.runs, 1);
        assert_eq!(*account.fetch_calls.borrow(), 1);
    }

    #[test]
    fn it_stalls_when_nothing_can_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = ScriptedAccount::new(vec![Ok(bookmarks(&["100", "200"]))]);
        account.reject_removals = true;
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Stalled);
        assert_eq!(report.total_saved, 2);
        assert_eq!(report.total_removed, 0);
    }

    #[test]
    fn it_respects_the_run_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![
            Ok(bookmarks(&["100"])),
            Ok(bookmarks(&["200"])),
            Ok(bookmarks(&["300"])),
        ]);
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 2, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::CeilingReached);
        assert_eq!(report.runs, 2);
        assert_eq!(*account.fetch_calls.borrow(), 2);
    }

    #[test]
    fn it_keeps_totals_when_a_later_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![Ok(bookmarks(&["100", "200"]))]);
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::FetchFailed);
        assert_eq!(report.runs, 1);
        assert_eq!(report.total_saved, 2);
        assert_eq!(report.total_removed, 2);
    }

    #[test]
    fn it_fails_hard_when_the_first_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![]);
        let stop = StopSignal::stub(false);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let result = synchronize(&runner, &stop, false, 100, Duration::ZERO);

        assert!(result.is_err());
    }

    #[test]
    fn it_reports_interrupted_without_running_when_already_tripped() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![Ok(bookmarks(&["100"]))]);
        let stop = StopSignal::stub(true);
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.runs, 0);
        assert_eq!(*account.fetch_calls.borrow(), 0);
    }

    #[test]
    fn it_fails_hard_when_the_first_archive_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let account = ScriptedAccount::new(vec![Ok(bookmarks(&["100"]))]);
        let stop = StopSignal::stub(false);
        // The archive path is a directory, so the very first merge fails.
        let runner = runner(&account, &stop, dir.path().to_path_buf());

        let err = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("Could not update"));
        assert!(!chain.contains("Could not fetch bookmarks"));
    }

    #[test]
    fn it_stops_with_archive_failed_on_a_later_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.txt");
        let sabotage = path.clone();
        let stop = StopSignal::stub(false);
        let mut account =
            ScriptedAccount::new(vec![Ok(bookmarks(&["100"])), Ok(bookmarks(&["200"]))]);
        // The first run's removal turns the archive into a directory, so the
        // second run's write fails while the first run's totals stand.
        account.on_removal = Some(Box::new(move || {
            let _ = fs::remove_file(&sabotage);
            let _ = fs::create_dir(&sabotage);
        }));
        let runner = runner(&account, &stop, path);

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::ArchiveFailed);
        assert_eq!(report.runs, 1);
        assert_eq!(report.total_saved, 1);
        assert_eq!(report.total_removed, 1);
    }

    #[test]
    fn it_reports_an_interrupt_over_a_clean_single_run() {
        let dir = tempfile::tempdir().unwrap();
        let stop = StopSignal::stub(false);
        let mut account = ScriptedAccount::new(vec![Ok(bookmarks(&["100", "200"]))]);
        account.on_removal = Some(Box::new(|| stop.trip()));
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, true, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.runs, 1);
        assert_eq!(report.total_saved, 2);
        assert_eq!(report.total_removed, 1);
    }

    #[test]
    fn it_reports_an_interrupt_over_a_stall() {
        let dir = tempfile::tempdir().unwrap();
        let stop = StopSignal::stub(false);
        let mut account = ScriptedAccount::new(vec![Ok(bookmarks(&["100", "200"]))]);
        account.reject_removals = true;
        account.on_removal = Some(Box::new(|| stop.trip()));
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.total_saved, 2);
        assert_eq!(report.total_removed, 0);
    }

    #[test]
    fn it_stops_when_the_run_delay_wait_is_cut_short() {
        let dir = tempfile::tempdir().unwrap();
        let account =
            ScriptedAccount::new(vec![Ok(bookmarks(&["100"])), Ok(bookmarks(&["200"]))]);
        let stop = StopSignal::stub(false);
        stop.queue_signal();
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::from_secs(600)).unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.runs, 1);
        assert_eq!(*account.fetch_calls.borrow(), 1);
    }

    #[test]
    fn it_reports_an_interrupt_that_cuts_a_fetch_wait() {
        let dir = tempfile::tempdir().unwrap();
        let stop = StopSignal::stub(false);
        let mut account = ScriptedAccount::new(vec![Err(anyhow!("429 Too Many Requests"))]);
        account.on_fetch = Some(Box::new(|| stop.trip()));
        let runner = runner(&account, &stop, dir.path().join("bookmarks.txt"));

        let report = synchronize(&runner, &stop, false, 100, Duration::ZERO).unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.runs, 0);
        assert_eq!(report.total_saved, 0);
    }
}
