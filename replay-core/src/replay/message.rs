//! Commit message rewriting and provenance markers

use git2::Oid;

use super::history::HistoryEntry;

/// Original message with trailing whitespace removed
pub fn original(message: &str) -> String {
    message.trim_end().to_string()
}

/// Message for a merge, listing the commits it brought in
pub fn merge_summary(merge: &HistoryEntry, merged: &[HistoryEntry], max_listed: usize) -> String {
    let mut out = merge.summary.clone();
    if merged.is_empty() {
        return out;
    }

    out.push_str("\n\nIncludes:");
    for entry in merged.iter().take(max_listed) {
        out.push_str(&format!(
            "\n- {} {} ({})",
            entry.short_id(),
            entry.summary,
            entry.author
        ));
    }
    if merged.len() > max_listed {
        out.push_str(&format!("\n- ... and {} more", merged.len() - max_listed));
    }

    out
}

/// Message for a snapshot of `branch` at `tip`
pub fn snapshot(branch: &str, tip: &HistoryEntry) -> String {
    format!(
        "Snapshot of {} at {}\n\nLatest change: {}",
        branch,
        tip.short_id(),
        tip.summary
    )
}

/// Append the `key: <source>` trailer
///
/// Joins an existing trailer block in the last paragraph, otherwise starts a
/// new paragraph.
pub fn with_marker(message: &str, key: &str, source: Oid) -> String {
    let body = message.trim_end();
    let trailer = format!("{}: {}", key, source);

    if body.is_empty() {
        return format!("{}\n", trailer);
    }

    let last_paragraph = body.rsplit("\n\n").next().unwrap_or("");
    let has_title_above = body.contains("\n\n");

    if has_title_above && is_trailer_block(last_paragraph) {
        format!("{}\n{}\n", body, trailer)
    } else {
        format!("{}\n\n{}\n", body, trailer)
    }
}

fn is_trailer_block(paragraph: &str) -> bool {
    let mut lines = paragraph.lines().peekable();
    if lines.peek().is_none() {
        return false;
    }

    lines.all(|line| match line.split_once(": ") {
        Some((key, value)) => {
            !key.is_empty()
                && !value.trim().is_empty()
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    })
}

/// Source commit recorded by the last `key:` trailer in `message`
pub fn parse_marker(message: &str, key: &str) -> Option<Oid> {
    message
        .lines()
        .rev()
        .filter_map(|line| line.trim().strip_prefix(key)?.strip_prefix(':'))
        .map(str::trim)
        .find(|value| is_object_id(value))
        .and_then(|value| Oid::from_str(value).ok())
}

fn is_object_id(value: &str) -> bool {
    (value.len() == 40 || value.len() == 64) && value.chars().all(|c| c.is_ascii_hexdigit())
}
