//! Inline ignore directives.
//!
//! `ferret-ignore <RULE_ID|*> [reason]` suppresses findings on its own line
//! and the line directly below it. `ferret-disable` ... `ferret-enable`
//! fences suppress everything in between. Directives only count inside a
//! comment for the file's syntax, so matching rule patterns can't
//! accidentally disarm themselves.

use std::collections::HashMap;

use ferret_rules::FileType;

/// Marker that gates the (cheap) full parse.
pub const MARKER: &str = "ferret-";

const IGNORE_DIRECTIVE: &str = "ferret-ignore";
const DISABLE_DIRECTIVE: &str = "ferret-disable";
const ENABLE_DIRECTIVE: &str = "ferret-enable";

/// Comment tokens per file type.
fn comment_tokens(file_type: FileType) -> &'static [&'static str] {
    match file_type {
        FileType::Md => &["<!--", "#"],
        FileType::Sh | FileType::Bash | FileType::Zsh | FileType::Yaml | FileType::Yml => &["#"],
        FileType::Ts | FileType::Js | FileType::Tsx | FileType::Jsx => &["//", "/*"],
        // JSON has no comments, but JSONC-style files are common in the
        // wild; accept the JS tokens.
        FileType::Json => &["//", "/*"],
    }
}

#[derive(Debug, Clone)]
enum LineDirective {
    /// Suppress every rule.
    All,
    /// Suppress a single rule id.
    Rule(String),
}

/// Parsed inline-ignore state for one file.
#[derive(Debug, Default)]
pub struct IgnoreState {
    /// Directive line -> what it suppresses.
    line_directives: HashMap<usize, LineDirective>,
    /// Inclusive (start, end) line ranges from disable/enable fences.
    disabled_ranges: Vec<(usize, usize)>,
}

impl IgnoreState {
    /// Parse directives out of `content`. Pure function of content + type.
    pub fn parse(content: &str, file_type: FileType) -> Self {
        if !content.contains(MARKER) {
            return Self::default();
        }

        let tokens = comment_tokens(file_type);
        let mut state = Self::default();
        let mut open_disable: Option<usize> = None;
        let mut line_count = 0;

        for (idx, line) in content.lines().enumerate() {
            let line_number = idx + 1;
            line_count = line_number;

            let Some(directive_start) = line.find(MARKER) else {
                continue;
            };
            // The directive must sit inside a comment.
            if !tokens.iter().any(|t| line[..directive_start].contains(t)) {
                continue;
            }
            let directive = &line[directive_start..];

            if directive.starts_with(DISABLE_DIRECTIVE) {
                open_disable.get_or_insert(line_number);
            } else if directive.starts_with(ENABLE_DIRECTIVE) {
                if let Some(start) = open_disable.take() {
                    state.disabled_ranges.push((start, line_number));
                }
            } else if let Some(rest) = directive.strip_prefix(IGNORE_DIRECTIVE) {
                let target = rest
                    .trim_start()
                    .split_whitespace()
                    .next()
                    .unwrap_or("*")
                    .trim_end_matches("-->");
                let parsed = if target == "*" || target.is_empty() {
                    LineDirective::All
                } else {
                    LineDirective::Rule(target.to_string())
                };
                state.line_directives.insert(line_number, parsed);
            }
        }

        // An unclosed disable fence runs to end of file.
        if let Some(start) = open_disable {
            state.disabled_ranges.push((start, line_count));
        }
        state
    }

    /// Whether a finding at (`line`, `rule_id`) is suppressed.
    pub fn is_suppressed(&self, line: usize, rule_id: &str) -> bool {
        if self
            .disabled_ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&line))
        {
            return true;
        }
        // A line directive covers its own line and the next one.
        for candidate in [line, line.saturating_sub(1)] {
            if candidate == 0 {
                continue;
            }
            match self.line_directives.get(&candidate) {
                Some(LineDirective::All) => return true,
                Some(LineDirective::Rule(id)) if id == rule_id => return true,
                _ => {}
            }
        }
        false
    }

    /// True when the file carries no directives at all.
    pub fn is_empty(&self) -> bool {
        self.line_directives.is_empty() && self.disabled_ranges.is_empty()
    }
}
