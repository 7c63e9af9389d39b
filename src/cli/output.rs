//! CLI output formatting utilities.

use crate::agent::TurnEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a tool with its server and description.
    pub fn tool_info(name: &str, server: &str, description: &str) {
        println!("  {} {} ({})", style("*").cyan(), style(name).bold(), style(server).dim());
        if !description.is_empty() {
            println!("    {}", content_preview(description, 100));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Renders turn events as they arrive.
pub struct TurnRenderer<W: Write> {
    out: W,
    label: String,
    /// Text fragments were printed since the last tool event.
    streaming: bool,
}

impl TurnRenderer<std::io::Stdout> {
    pub fn stdout(label: &str) -> Self {
        Self::new(std::io::stdout(), label)
    }
}

impl<W: Write> TurnRenderer<W> {
    pub fn new(out: W, label: &str) -> Self {
        Self {
            out,
            label: label.to_string(),
            streaming: false,
        }
    }

    pub fn render(&mut self, event: TurnEvent) {
        // A closed stdout is not worth failing the turn over.
        let _ = self.write_event(event);
    }

    fn write_event(&mut self, event: TurnEvent) -> std::io::Result<()> {
        match event {
            TurnEvent::TextFragment(fragment) => {
                if !self.streaming {
                    write!(self.out, "\n{} ", style(format!("{}:", self.label)).cyan().bold())?;
                    self.streaming = true;
                }
                write!(self.out, "{}", fragment)?;
                self.out.flush()?;
            }
            TurnEvent::ToolStarted { name, arguments, .. } => {
                self.end_text()?;
                writeln!(
                    self.out,
                    "{}",
                    style(format!("  Starting tool: {} with inputs: {}", name, arguments)).dim()
                )?;
            }
            TurnEvent::ToolFinished {
                name,
                output,
                is_error,
                ..
            } => {
                if is_error {
                    writeln!(
                        self.out,
                        "  {} {}: {}",
                        style("✗").red(),
                        name,
                        content_preview(&output, 120)
                    )?;
                } else {
                    writeln!(self.out, "  {} {}", style("✓").green(), name)?;
                }
            }
            TurnEvent::TurnComplete { content, .. } => {
                if self.streaming {
                    writeln!(self.out)?;
                } else {
                    writeln!(self.out, "\n{} {}", style(format!("{}:", self.label)).cyan().bold(), content)?;
                }
                writeln!(self.out)?;
                self.streaming = false;
                self.out.flush()?;
            }
        }
        Ok(())
    }

    /// Finish a line of streamed text before printing something else.
    fn end_text(&mut self) -> std::io::Result<()> {
        if self.streaming {
            writeln!(self.out)?;
            self.streaming = false;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let cut: String = content.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_all(events: Vec<TurnEvent>) -> String {
        console::set_colors_enabled(false);
        let mut renderer = TurnRenderer::new(Vec::new(), "Assistant");
        for event in events {
            renderer.render(event);
        }
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_streamed_text_is_not_printed_twice() {
        let out = render_all(vec![
            TurnEvent::TextFragment("Task ".to_string()),
            TurnEvent::TextFragment("added.".to_string()),
            TurnEvent::TurnComplete {
                content: "Task added.".to_string(),
                hops: 1,
            },
        ]);
        assert_eq!(out.matches("Task added.").count(), 1);
        assert!(out.contains("Assistant: Task added."));
    }

    #[test]
    fn test_complete_answer_printed_when_nothing_streamed() {
        let out = render_all(vec![TurnEvent::TurnComplete {
            content: "You have 2 tasks.".to_string(),
            hops: 1,
        }]);
        assert!(out.contains("Assistant: You have 2 tasks."));
    }

    #[test]
    fn test_tool_events_are_announced() {
        let out = render_all(vec![
            TurnEvent::ToolStarted {
                call_id: "call_1".to_string(),
                name: "create_task".to_string(),
                arguments: r#"{"title":"Buy milk"}"#.to_string(),
            },
            TurnEvent::ToolFinished {
                call_id: "call_1".to_string(),
                name: "create_task".to_string(),
                output: "Error: quota exceeded".to_string(),
                is_error: true,
            },
        ]);
        assert!(out.contains(r#"Starting tool: create_task with inputs: {"title":"Buy milk"}"#));
        assert!(out.contains("create_task: Error: quota exceeded"));
    }

    #[test]
    fn test_content_preview_truncates_on_char_boundary() {
        assert_eq!(content_preview("ééééé", 3), "ééé...");
        assert_eq!(content_preview("a\nb", 10), "a b");
    }
}
