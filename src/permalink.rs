use crate::types::BookmarkEntry;

/// Builds the public status URL for an entry. Entries without a known author
/// get the generic `/i/web/status/` form, which the service redirects.
pub fn status_url(base_url: &str, entry: &BookmarkEntry) -> String {
    let base = base_url.trim_end_matches('/');

    match &entry.author {
        Some(author) => format!("{}/{}/status/{}", base, author, entry.id),
        None => format!("{}/i/web/status/{}", base, entry.id),
    }
}
