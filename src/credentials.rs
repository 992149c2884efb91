use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_token: String,
    pub ct0: String,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Credentials> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read credentials file {}", path.display()))?;

        Credentials::parse(&content)
            .with_context(|| format!("credentials file {}", path.display()))
    }

    /// Parses the `key=value;key=value` cookie pair format. Both `auth_token`
    /// and `ct0` must be present and non-empty.
    pub fn parse(content: &str) -> Result<Credentials> {
        let mut auth_token = None;
        let mut ct0 = None;

        for item in content.trim().split(';') {
            let part = item.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "auth_token" => auth_token = Some(value.trim().to_string()),
                "ct0" => ct0 = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let auth_token = auth_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("missing auth_token"))?;
        let ct0 = ct0
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("missing ct0"))?;

        Ok(Credentials { auth_token, ct0 })
    }
}
