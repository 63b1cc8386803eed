//! Mention handle extraction.
//!
//! Handle grammar: `@` followed by one to three word tokens separated by
//! single spaces. Since post authors have multi-word display names, a handle
//! cannot be delimited syntactically; resolution is a dictionary lookup that
//! tries the longest token prefix first against exact user names, so trailing
//! punctuation and following prose never end up inside a mention.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::models::User;

/// Longest candidate handle length, in word tokens.
const MAX_HANDLE_TOKENS: usize = 3;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\B@(\w+(?: \w+){0,2})").expect("mention pattern"));

/// Every name a mention in `content` could refer to: for each `@` capture,
/// all of its token prefixes, deduplicated. One roster query over this list
/// covers every possible resolution.
pub fn candidate_names(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    for cap in MENTION_RE.captures_iter(content) {
        let tokens: Vec<&str> = cap[1].split(' ').collect();
        for n in 1..=tokens.len().min(MAX_HANDLE_TOKENS) {
            let name = tokens[..n].join(" ");
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Resolve the mentions in `content` against a user roster. Each `@` capture
/// resolves to at most one user (longest matching prefix wins); users are
/// deduplicated across captures, in first-mention order.
pub fn resolve_handles<'a>(content: &str, roster: &'a [User]) -> Vec<&'a User> {
    let mut resolved: Vec<&User> = Vec::new();
    for cap in MENTION_RE.captures_iter(content) {
        let tokens: Vec<&str> = cap[1].split(' ').collect();
        let longest = tokens.len().min(MAX_HANDLE_TOKENS);
        for n in (1..=longest).rev() {
            let candidate = tokens[..n].join(" ");
            if let Some(user) = roster.iter().find(|u| u.name == candidate) {
                if !resolved.iter().any(|u| u.id == user.id) {
                    resolved.push(user);
                }
                break;
            }
        }
    }
    resolved
}
