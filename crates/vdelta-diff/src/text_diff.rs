//! Character data diff for text and comment nodes.
//!
//! This is a cheap substring heuristic, not a minimal edit: it recognises a
//! pure truncation (`next` occurs inside `last`) and a pure extension (`last`
//! occurs inside `next`). Anything else, and any short value, is rewritten
//! whole.

use vdelta_types::Instruction;

use crate::config::DiffConfig;

/// Diff two character data values. Returns `None` when they are equal.
///
/// Offsets in `EditTextData` are counted in chars, not bytes.
pub fn diff_text(last: &str, next: &str, config: &DiffConfig) -> Option<Instruction> {
    if last == next {
        return None;
    }

    let next_len = next.chars().count();
    if next_len <= config.short_text_len || last.is_empty() {
        return Some(set(next));
    }

    if let Some(at) = last.find(next) {
        let start = last[..at].chars().count();
        let end = last.chars().count() - start - next_len;
        return Some(Instruction::EditTextData {
            start: start as u32,
            end: end as u32,
            prefix: String::new(),
            suffix: String::new(),
        });
    }

    if let Some(at) = next.find(last) {
        return Some(Instruction::EditTextData {
            start: 0,
            end: 0,
            prefix: next[..at].to_string(),
            suffix: next[at + last.len()..].to_string(),
        });
    }

    Some(set(next))
}

fn set(data: &str) -> Instruction {
    Instruction::SetTextData {
        data: data.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(last: &str, next: &str) -> Option<Instruction> {
        diff_text(last, next, &DiffConfig::default())
    }

    fn edit(start: u32, end: u32, prefix: &str, suffix: &str) -> Option<Instruction> {
        Some(Instruction::EditTextData {
            start,
            end,
            prefix: prefix.into(),
            suffix: suffix.into(),
        })
    }

    #[test]
    fn equal_data_is_no_change() {
        assert_eq!(text("same text here", "same text here"), None);
        assert_eq!(text("", ""), None);
    }

    #[test]
    fn short_values_are_overwritten() {
        // Two chars: overwritten regardless of any substring relation.
        assert_eq!(
            text("abc", "xy"),
            Some(Instruction::SetTextData { data: "xy".into() })
        );
        // "hello" is five chars, inside the overwrite threshold even though
        // it is a prefix of the old value. The short-text rule is checked
        // before any substring match.
        assert_eq!(
            text("hello world", "hello"),
            Some(Instruction::SetTextData { data: "hello".into() })
        );
    }

    #[test]
    fn truncation_keeps_a_substring() {
        // "hello world" sits at char 4 with nothing after it.
        assert_eq!(text("say hello world", "hello world"), edit(4, 0, "", ""));
        // Interior substring: drop from both ends.
        assert_eq!(text("<< keep me here >>", "keep me here"), edit(3, 3, "", ""));
    }

    #[test]
    fn extension_wraps_the_old_value() {
        assert_eq!(
            text("middle part", "a middle part!"),
            edit(0, 0, "a ", "!")
        );
    }

    #[test]
    fn unrelated_values_are_overwritten() {
        assert_eq!(
            text("the quick brown fox", "jumps over the dog"),
            Some(Instruction::SetTextData {
                data: "jumps over the dog".into()
            })
        );
    }

    #[test]
    fn empty_old_value_is_overwritten() {
        assert_eq!(
            text("", "brand new text"),
            Some(Instruction::SetTextData {
                data: "brand new text".into()
            })
        );
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        assert_eq!(text("ééé-héllo wörld", "héllo wörld"), edit(4, 0, "", ""));
    }

    #[test]
    fn threshold_is_configurable() {
        let config = DiffConfig { short_text_len: 0 };
        assert_eq!(diff_text("abcdef", "bcd", &config), edit(1, 2, "", ""));
    }
}
