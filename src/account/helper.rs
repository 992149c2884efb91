use std::process::Command;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::credentials::Credentials;

use super::Account;

// Talks to the account through an external helper program. The helper gets
// the session cookies through the environment and speaks JSON on stdout;
// whatever it prints on stderr becomes the error text, which is what the
// retry layer classifies.
pub struct HelperAccount {
    program: String,
    credentials: Credentials,
}

impl HelperAccount {
    pub fn new(program: String, credentials: Credentials) -> Self {
        HelperAccount {
            program,
            credentials,
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(args)
            .env("X_AUTH_TOKEN", &self.credentials.auth_token)
            .env("X_CT0", &self.credentials.ct0)
            .output()
            .with_context(|| format!("Could not run helper program {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            if message.is_empty() {
                return Err(anyhow!(
                    "Helper program {} exited with {}",
                    self.program,
                    output.status
                ));
            }
            return Err(anyhow!("{message}"));
        }

        Ok(output.stdout)
    }
}

impl Account for HelperAccount {
    fn fetch_bookmarks(&self) -> Result<Value> {
        let stdout = self.run(&["bookmarks"])?;
        serde_json::from_slice(&stdout).context("Helper program returned malformed bookmark data")
    }

    fn remove_bookmark(&self, id: &str) -> Result<()> {
        self.run(&["unbookmark", id])?;
        Ok(())
    }
}
