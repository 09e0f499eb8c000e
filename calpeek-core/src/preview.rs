//! Bounded description previews.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CalPeekError;

pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Where a long description gets cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruncateRule {
    /// Hard cut after `max_chars` characters.
    #[default]
    Chars,
    /// Cut at the last whitespace within the budget, falling back to a hard cut.
    WordBoundary,
}

impl FromStr for TruncateRule {
    type Err = CalPeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "chars" => Ok(TruncateRule::Chars),
            "word-boundary" => Ok(TruncateRule::WordBoundary),
            other => Err(CalPeekError::Config(format!(
                "Unknown truncate rule '{}'. Expected 'chars' or 'word-boundary'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Budget in characters (Unicode scalar values, not bytes)
    pub max_chars: usize,
    pub rule: TruncateRule,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions {
            max_chars: DEFAULT_PREVIEW_LENGTH,
            rule: TruncateRule::Chars,
        }
    }
}

/// The displayable part of an event description.
///
/// `text` never exceeds the configured budget; `Display` adds a trailing
/// `...` when something was cut off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionPreview {
    text: String,
    truncated: bool,
}

impl DescriptionPreview {
    pub fn new(description: &str, options: PreviewOptions) -> Self {
        let cut = match description.char_indices().nth(options.max_chars) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                return DescriptionPreview {
                    text: description.to_string(),
                    truncated: false,
                };
            }
        };

        let head = &description[..cut];
        let text = match options.rule {
            TruncateRule::Chars => head,
            TruncateRule::WordBoundary if description[cut..].starts_with(char::is_whitespace) => {
                match head.trim_end() {
                    "" => head,
                    trimmed => trimmed,
                }
            }
            TruncateRule::WordBoundary => match head.rfind(char::is_whitespace) {
                Some(idx) if !head[..idx].trim_end().is_empty() => head[..idx].trim_end(),
                _ => head,
            },
        };

        DescriptionPreview {
            text: text.to_string(),
            truncated: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Display for DescriptionPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.truncated {
            write!(f, "{}...", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}
