//! Removal of `<think>` reasoning blocks emitted by reasoning models such as qwen3.

use regex::Regex;
use std::sync::OnceLock;

const OPEN: &str = "<think>";
const CLOSE: &str = "</think>";

fn think_blocks() -> &'static Regex {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    BLOCKS.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("Invalid regex"))
}

/// Strip complete and dangling reasoning blocks from a full response.
pub fn strip_reasoning(text: &str) -> String {
    let stripped = think_blocks().replace_all(text, "");

    // An unterminated block swallows the rest of the text.
    let stripped = match stripped.find(OPEN) {
        Some(start) => &stripped[..start],
        None => &stripped[..],
    };

    stripped.trim().to_string()
}

/// Incremental version of [`strip_reasoning`] for streamed fragments.
///
/// Holds back text that could be the start of a tag split across fragments.
#[derive(Debug, Default)]
pub struct ReasoningFilter {
    enabled: bool,
    inside: bool,
    pending: String,
    emitted_any: bool,
}

impl ReasoningFilter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Feed a fragment; returns the text that is safe to show.
    pub fn push(&mut self, fragment: &str) -> String {
        if !self.enabled {
            return fragment.to_string();
        }

        self.pending.push_str(fragment);
        let mut visible = String::new();

        loop {
            if self.inside {
                match self.pending.find(CLOSE) {
                    Some(end) => {
                        self.pending.drain(..end + CLOSE.len());
                        self.inside = false;
                    }
                    None => {
                        let keep = partial_suffix(&self.pending, CLOSE);
                        self.pending.drain(..self.pending.len() - keep);
                        break;
                    }
                }
            } else {
                match self.pending.find(OPEN) {
                    Some(start) => {
                        visible.push_str(&self.pending[..start]);
                        self.pending.drain(..start + OPEN.len());
                        self.inside = true;
                    }
                    None => {
                        let keep = partial_suffix(&self.pending, OPEN);
                        let emit = self.pending.len() - keep;
                        visible.push_str(&self.pending[..emit]);
                        self.pending.drain(..emit);
                        break;
                    }
                }
            }
        }

        self.trim_leading(visible)
    }

    /// Release held-back text at the end of the stream.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        if self.inside {
            self.inside = false;
            return String::new();
        }
        self.trim_leading(rest)
    }

    /// Reasoning blocks are usually followed by blank lines; drop them before the first visible text.
    fn trim_leading(&mut self, text: String) -> String {
        if self.emitted_any {
            return text;
        }
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return String::new();
        }
        self.emitted_any = true;
        trimmed.to_string()
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`.
fn partial_suffix(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| text.ends_with(&tag[..len]))
        .unwrap_or(0)
}
