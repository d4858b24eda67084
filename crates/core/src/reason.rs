//! Substantive-reason heuristic
//!
//! A pure scoring function over the free-text justification. The score is
//! advisory: the gate logs a low-effort reason but only the character-count
//! minimum actually blocks submission.

/// Common low-effort phrases that should not pass.
const LOW_EFFORT_PHRASES: &[&str] = &[
    "idk",
    "i don't know",
    "dont know",
    "bored",
    "no reason",
    "just because",
    "because",
    "why not",
];

/// Keywords that usually indicate a specific task.
const TASK_KEYWORDS: &[&str] = &[
    "homework",
    "assignment",
    "project",
    "deadline",
    "work",
    "study",
    "research",
    "school",
    "urgent",
];

/// Score a justification: `true` when it reads as a substantive reason.
///
/// Rules, in order: empty/whitespace-only fails; any low-effort phrase
/// fails; any task keyword passes; otherwise pass iff the word count is at
/// least five.
pub fn is_substantive_reason(reason: &str) -> bool {
    let r = reason.trim().to_lowercase();
    if r.is_empty() {
        return false;
    }

    if LOW_EFFORT_PHRASES.iter().any(|p| r.contains(p)) {
        return false;
    }

    if TASK_KEYWORDS.iter().any(|k| r.contains(k)) {
        return true;
    }

    r.split_whitespace().count() >= 5
}
