use anyhow::Result;
use serde_json::Value;

pub mod helper;

pub trait Account {
    fn fetch_bookmarks(&self) -> Result<Value>;
    fn remove_bookmark(&self, id: &str) -> Result<()>;
}
