//! Fence repair: every opening code fence gets a closing one.

use crate::code_block::parse_fence;

/// Balances code fences line by line.
///
/// Each fence line toggles the "inside" state. A closing fence that carries a
/// language tag is rewritten to a bare fence; an unclosed fence at the end of
/// the text gets a closing line appended. All other lines pass through.
pub fn repair_fences(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut inside = false;
    for line in text.split('\n') {
        match parse_fence(line) {
            Some(info) if inside => {
                out.push(if info.is_empty() { line } else { "```" });
                inside = false;
            }
            Some(_) => {
                out.push(line);
                inside = true;
            }
            None => out.push(line),
        }
    }

    let mut repaired = out.join("\n");
    if inside {
        if !repaired.ends_with('\n') {
            repaired.push('\n');
        }
        repaired.push_str("```");
    }
    repaired
}

/// Number of fence-marker lines in `text`.
pub fn count_fences(text: &str) -> usize {
    text.split('\n').filter(|line| parse_fence(line).is_some()).count()
}
