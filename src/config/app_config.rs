use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
pub struct AppConfig {
    pub(super) archive_file: String,
    pub(super) credentials_file: String,
    pub(super) helper_program: String,
    pub(super) base_url: String,
    pub(super) delay_between_requests: f64,
    pub(super) delay_between_runs: f64,
    pub(super) max_runs: usize,
    pub(super) write_mode: String,
    pub(super) dedupe_history: bool,
}

impl AppConfig {
    pub fn new_default() -> AppConfig {
        AppConfig {
            archive_file: "bookmarks.txt".to_string(),
            credentials_file: "creds.txt".to_string(),
            helper_program: "x-bookmark-client".to_string(),
            base_url: "https://twitter.com".to_string(),
            delay_between_requests: 2.0,
            delay_between_runs: 1.0,
            max_runs: 100,
            write_mode: "a".to_string(),
            dedupe_history: false,
        }
    }
}
