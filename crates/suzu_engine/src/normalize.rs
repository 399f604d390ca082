//! Message normalization
//!
//! Chat spam of the form "7777777777" and "777" should count as the same
//! token, so any message that is 3+ repetitions of a single character is
//! collapsed to its first 3 characters. Nothing else is touched: no trim,
//! no case folding, no Unicode normalization.

use std::borrow::Cow;

/// Collapse a repeated-character message to its 3-character canonical form.
///
/// A character here is a Unicode scalar, so `"わわわわ"` collapses to
/// `"わわわ"` while a 3-character mixed string passes through unchanged.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return Cow::Borrowed(text);
    };
    let mut len = 1usize;
    for c in chars {
        if c != first {
            return Cow::Borrowed(text);
        }
        len += 1;
    }
    if len <= 3 {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().take(3).collect())
    }
}
