use std::collections::HashSet;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::types::BookmarkEntry;

// The bookmark endpoint is not stable about its response shape: depending on
// client version it has returned plain id lists, flat tweet objects, and the
// nested GraphQL timeline documents. Shapes are tried in that priority order
// and the first structural match wins. Extraction never fails; anything
// unrecognized degrades to a partial (or empty) result with a warning.
pub fn extract_entries(raw: &Value) -> Vec<BookmarkEntry> {
    let mut collector = EntryCollector::new();

    match raw {
        Value::Array(items) => match items.first() {
            None => {}
            Some(first) if first.is_string() || first.is_number() => {
                for item in items {
                    if let Some(id) = scalar_id(item) {
                        collector.add(&id, None);
                    }
                }
            }
            Some(first) if is_flat_tweet(first) => {
                for item in items {
                    collect_flat(item, &mut collector);
                }
            }
            Some(_) => {
                for item in items.iter().filter(|i| i.is_object()) {
                    collect_timeline(item, &mut collector);
                }
            }
        },
        Value::Object(_) => collect_timeline(raw, &mut collector),
        _ => warn!("bookmark payload has an unrecognized shape; nothing extracted"),
    }

    collector.into_entries()
}

// Scoped to a single payload: drops ids seen earlier, first occurrence keeps
// its position.
struct EntryCollector {
    seen: HashSet<String>,
    entries: Vec<BookmarkEntry>,
}

impl EntryCollector {
    fn new() -> Self {
        EntryCollector {
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, id: &str, author: Option<&str>) {
        let id = id.trim();
        if id.is_empty() || self.seen.contains(id) {
            return;
        }
        self.seen.insert(id.to_string());
        self.entries.push(BookmarkEntry::new(id, author));
    }

    fn into_entries(self) -> Vec<BookmarkEntry> {
        self.entries
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_flat_tweet(value: &Value) -> bool {
    value.get("id").is_some() || value.get("id_str").is_some()
}

#[derive(Deserialize)]
struct FlatTweet {
    id_str: Option<Value>,
    id: Option<Value>,
    user: Option<FlatUser>,
}

#[derive(Deserialize)]
struct FlatUser {
    screen_name: Option<String>,
}

fn collect_flat(item: &Value, out: &mut EntryCollector) {
    let tweet: FlatTweet = match serde_json::from_value(item.clone()) {
        Ok(tweet) => tweet,
        Err(err) => {
            warn!("skipping bookmark record that does not decode: {err}");
            return;
        }
    };

    // id_str wins, but an empty one falls through to the numeric id.
    let id = tweet
        .id_str
        .as_ref()
        .and_then(scalar_id)
        .filter(|id| !id.trim().is_empty())
        .or_else(|| tweet.id.as_ref().and_then(scalar_id));

    if let Some(id) = id {
        let author = tweet.user.and_then(|u| u.screen_name);
        out.add(&id, author.as_deref());
    }
}

#[derive(Deserialize)]
struct TimelineDocument {
    data: Option<TimelineData>,
}

#[derive(Deserialize)]
struct TimelineData {
    bookmark_timeline_v2: Option<TimelineHolder>,
    user: Option<UserHolder>,
}

#[derive(Deserialize)]
struct TimelineHolder {
    timeline: Option<Timeline>,
}

#[derive(Deserialize)]
struct UserHolder {
    result: Option<UserResult>,
}

#[derive(Deserialize)]
struct UserResult {
    timeline_v2: Option<TimelineHolder>,
}

#[derive(Deserialize)]
struct Timeline {
    instructions: Option<Vec<Instruction>>,
}

#[derive(Deserialize)]
struct Instruction {
    #[serde(rename = "type")]
    kind: Option<String>,
    entries: Option<Vec<TimelineEntry>>,
}

#[derive(Deserialize)]
struct TimelineEntry {
    content: Option<EntryContent>,
}

#[derive(Deserialize)]
struct EntryContent {
    #[serde(rename = "entryType")]
    entry_type: Option<String>,
    #[serde(rename = "itemContent")]
    item_content: Option<ItemContent>,
}

#[derive(Deserialize)]
struct ItemContent {
    #[serde(rename = "itemType")]
    item_type: Option<String>,
    tweet_results: Option<TweetResults>,
}

#[derive(Deserialize)]
struct TweetResults {
    result: Option<TweetResult>,
}

#[derive(Deserialize)]
struct TweetResult {
    rest_id: Option<Value>,
    core: Option<TweetCore>,
}

#[derive(Deserialize)]
struct TweetCore {
    user_results: Option<UserResults>,
}

#[derive(Deserialize)]
struct UserResults {
    result: Option<UserInfo>,
}

#[derive(Deserialize)]
struct UserInfo {
    legacy: Option<LegacyUser>,
}

#[derive(Deserialize)]
struct LegacyUser {
    screen_name: Option<String>,
}

// The API serves the bookmark timeline under two different nesting paths
// depending on response context; the user/result chain is the fallback when
// the dedicated one is structurally absent.
fn resolve_timeline(data: TimelineData) -> Option<Timeline> {
    let primary = data.bookmark_timeline_v2.and_then(|h| h.timeline);
    match primary {
        Some(timeline) if timeline.instructions.is_some() => Some(timeline),
        _ => data
            .user
            .and_then(|u| u.result)
            .and_then(|r| r.timeline_v2)
            .and_then(|h| h.timeline),
    }
}

fn collect_timeline(doc: &Value, out: &mut EntryCollector) {
    let document: TimelineDocument = match serde_json::from_value(doc.clone()) {
        Ok(document) => document,
        Err(err) => {
            warn!("skipping timeline document that does not decode: {err}");
            return;
        }
    };

    let Some(timeline) = document.data.and_then(resolve_timeline) else {
        warn!("timeline document carries no recognizable timeline; nothing extracted");
        return;
    };

    for instruction in timeline.instructions.unwrap_or_default() {
        if instruction.kind.as_deref() != Some("TimelineAddEntries") {
            continue;
        }
        for entry in instruction.entries.unwrap_or_default() {
            let Some(content) = entry.content else { continue };
            if content.entry_type.as_deref() != Some("TimelineTimelineItem") {
                continue;
            }
            let Some(item) = content.item_content else { continue };
            if item.item_type.as_deref() != Some("TimelineTweet") {
                continue;
            }
            let Some(result) = item.tweet_results.and_then(|r| r.result) else {
                continue;
            };
            let Some(id) = result.rest_id.as_ref().and_then(scalar_id) else {
                continue;
            };
            let author = result
                .core
                .and_then(|c| c.user_results)
                .and_then(|u| u.result)
                .and_then(|i| i.legacy)
                .and_then(|l| l.screen_name);
            out.add(&id, author.as_deref());
        }
    }
}
