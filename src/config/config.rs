use home_dir::HomeDirExt;
use std::time::Duration;
use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, Result};
use url::Url;

use super::app_config::AppConfig;

pub struct Config {
    config_file: PathBuf,
    app_config: AppConfig,
}

impl Config {
    pub fn new_from_file(config_path: Option<String>) -> Result<Config> {
        if let Some(config_path) = config_path {
            let config_path = PathBuf::from(config_path);

            Config::new(config_path)
        } else {
            Config::new_default()
        }
    }

    pub fn new_default() -> Result<Config> {
        let config_directory_root =
            std::env::var("XDG_CONFIG_HOME").unwrap_or("~/.config".to_string());

        let config_directory = expand(&config_directory_root)?.join("x-bookmark-sync");
        let config_file = config_directory.join("config.toml");

        Config::new(config_file)
    }

    fn new(config_file: PathBuf) -> Result<Config> {
        if let Some(parent) = config_file.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(&parent.to_path_buf())?;
            }
        }

        let app_config: AppConfig = {
            let file_content = ensure_file(
                &config_file,
                toml::to_string_pretty(&AppConfig::new_default())?,
            )?;

            toml::from_str(&file_content)?
        };

        let config = Config {
            config_file,
            app_config,
        };

        config.validate().and(Ok(config))
    }

    // CLI flags win over the config file; the merged result is validated the
    // same way as a freshly loaded one.
    pub fn apply_overrides(
        &mut self,
        archive_file: Option<String>,
        delay_between_requests: Option<f64>,
        write_mode: Option<String>,
        max_runs: Option<usize>,
        delay_between_runs: Option<f64>,
        dedupe_history: bool,
    ) -> Result<()> {
        if let Some(path) = archive_file {
            self.app_config.archive_file = path;
        }
        if let Some(delay) = delay_between_requests {
            self.app_config.delay_between_requests = delay;
        }
        if let Some(mode) = write_mode {
            self.app_config.write_mode = mode;
        }
        if let Some(runs) = max_runs {
            self.app_config.max_runs = runs;
        }
        if let Some(delay) = delay_between_runs {
            self.app_config.delay_between_runs = delay;
        }
        if dedupe_history {
            self.app_config.dedupe_history = true;
        }

        self.validate()
    }

    pub fn get_archive_file(&self) -> Result<PathBuf> {
        expand(&self.app_config.archive_file)
    }

    pub fn get_credentials_file(&self) -> Result<PathBuf> {
        expand(&self.app_config.credentials_file)
    }

    pub fn get_helper_program(&self) -> String {
        self.app_config.helper_program.clone()
    }

    pub fn get_base_url(&self) -> String {
        self.app_config.base_url.clone()
    }

    // Only call after validate(); negative delays are rejected there.
    pub fn get_request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.app_config.delay_between_requests)
    }

    pub fn get_run_delay(&self) -> Duration {
        Duration::from_secs_f64(self.app_config.delay_between_runs)
    }

    pub fn get_max_runs(&self) -> usize {
        self.app_config.max_runs
    }

    pub fn get_write_mode(&self) -> String {
        self.app_config.write_mode.clone()
    }

    pub fn get_dedupe_history(&self) -> bool {
        self.app_config.dedupe_history
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_config.archive_file.is_empty() {
            return Err(anyhow!(
                "Given archive_file is empty (config file path: \"{}\")",
                self.config_file.display()
            ));
        }

        if self.app_config.credentials_file.is_empty() {
            return Err(anyhow!(
                "Given credentials_file is empty (config file path: \"{}\")",
                self.config_file.display()
            ));
        }

        if self.app_config.helper_program.is_empty() {
            return Err(anyhow!(
                "Given helper_program is empty (config file path: \"{}\")",
                self.config_file.display()
            ));
        }

        let base_url = Url::parse(&self.app_config.base_url).map_err(|e| {
            anyhow!(
                "Given base_url (\"{}\") is not a valid URL: {} (config file path: \"{}\")",
                self.app_config.base_url,
                e,
                self.config_file.display()
            )
        })?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(anyhow!(
                "Given base_url (\"{}\") must use http or https (config file path: \"{}\")",
                self.app_config.base_url,
                self.config_file.display()
            ));
        }

        let request_delay = self.app_config.delay_between_requests;
        if !request_delay.is_finite() || request_delay < 0.0 {
            return Err(anyhow!(
                "Given delay_between_requests ({}) must be a non-negative number (config file path: \"{}\")",
                request_delay,
                self.config_file.display()
            ));
        }

        let run_delay = self.app_config.delay_between_runs;
        if !run_delay.is_finite() || run_delay < 0.0 {
            return Err(anyhow!(
                "Given delay_between_runs ({}) must be a non-negative number (config file path: \"{}\")",
                run_delay,
                self.config_file.display()
            ));
        }

        if self.app_config.max_runs == 0 {
            return Err(anyhow!(
                "Given max_runs must be at least 1 (config file path: \"{}\")",
                self.config_file.display()
            ));
        }

        if !["a", "p", "ask"].contains(&self.app_config.write_mode.as_str()) {
            return Err(anyhow!(
                "Given write_mode (\"{}\") must be one of: a, p, ask (config file path: \"{}\")",
                self.app_config.write_mode,
                self.config_file.display()
            ));
        }

        Ok(())
    }
}

fn expand(path: &str) -> Result<PathBuf> {
    path.expand_home()
        .map_err(|e| anyhow!("Could not expand \"{path}\": {e:?}"))
}

fn ensure_dir(dir: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    Ok(())
}

fn ensure_file(file_path: &PathBuf, default: String) -> Result<String> {
    if !file_path.exists() {
        let mut file = std::fs::File::create(file_path)?;
        file.write_all(default.as_bytes())?;
        Ok(default)
    } else {
        Ok(std::fs::read_to_string(file_path)?)
    }
}
