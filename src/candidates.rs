//! Transient chat-candidate rows shown to the user
//!
//! A candidate is one group/channel the account could broadcast to, tagged
//! with whether it is already part of the saved target list. Candidates are
//! rebuilt on every remote fetch and never persisted.

use std::collections::BTreeMap;

use serde::Serialize;

/// Whether a candidate is already in the account's saved targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Saved,
    Discovered,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCandidate {
    pub id: i64,
    pub title: String,
    pub membership: Membership,
}

impl ChatCandidate {
    pub fn is_saved(&self) -> bool {
        self.membership == Membership::Saved
    }
}

/// Build the candidate list from a remote `(id, title)` listing merged with
/// the saved targets. Saved entries come first, then by title, matching the
/// ordering the control panel displays.
pub fn build_candidates(
    fetched: &[(i64, String)],
    target_chats: &BTreeMap<i64, String>,
) -> Vec<ChatCandidate> {
    let mut rows: Vec<ChatCandidate> = fetched
        .iter()
        .map(|(id, title)| ChatCandidate {
            id: *id,
            title: title.clone(),
            membership: if target_chats.contains_key(id) {
                Membership::Saved
            } else {
                Membership::Discovered
            },
        })
        .collect();

    // Saved targets the listing did not return still need a row, so the user
    // can see and remove stale entries.
    for (id, name) in target_chats {
        if !rows.iter().any(|c| c.id == *id) {
            rows.push(ChatCandidate {
                id: *id,
                title: name.clone(),
                membership: Membership::Saved,
            });
        }
    }

    sort_candidates(&mut rows);
    rows
}

/// Candidate rows for the saved targets alone (no remote fetch yet).
pub fn saved_candidates(target_chats: &BTreeMap<i64, String>) -> Vec<ChatCandidate> {
    let mut rows: Vec<ChatCandidate> = target_chats
        .iter()
        .map(|(id, name)| ChatCandidate {
            id: *id,
            title: name.clone(),
            membership: Membership::Saved,
        })
        .collect();
    sort_candidates(&mut rows);
    rows
}

/// Case-insensitive substring filter on the title.
pub fn filter_candidates(candidates: &[ChatCandidate], query: &str) -> Vec<ChatCandidate> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return candidates.to_vec();
    }
    candidates
        .iter()
        .filter(|c| c.title.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Look up a sent chat's display name in the most recent candidate list.
pub fn display_name(candidates: &[ChatCandidate], chat_id: i64) -> Option<String> {
    candidates
        .iter()
        .find(|c| c.id == chat_id)
        .map(|c| c.title.clone())
}

fn sort_candidates(rows: &mut [ChatCandidate]) {
    rows.sort_by(|a, b| {
        (!a.is_saved(), a.title.clone()).cmp(&(!b.is_saved(), b.title.clone()))
    });
}
