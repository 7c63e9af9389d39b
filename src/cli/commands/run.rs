//! One-shot prompt command.

use super::open_session;
use crate::agent::TurnEvent;
use crate::cli::{Output, TurnRenderer};
use crate::config::Settings;
use crate::llm::ResponseMode;
use anyhow::Result;

/// Run a single prompt through the agent.
pub async fn run_prompt(
    prompt: &str,
    thread: Option<String>,
    model: Option<String>,
    stream: bool,
    settings: Settings,
) -> Result<()> {
    let mode = if stream {
        ResponseMode::Stream
    } else {
        ResponseMode::Complete
    };
    let session = open_session(&settings, model, mode).await?;
    let thread_id = thread.unwrap_or_else(|| settings.agent.thread_id.clone());
    let agent = session.agent();

    let result = if stream {
        let mut renderer = TurnRenderer::stdout("Assistant");
        agent
            .run_turn(&thread_id, prompt, |event| renderer.render(event))
            .await
    } else {
        let spinner = Output::spinner("Agent working...");
        let result = agent
            .run_turn(&thread_id, prompt, |event| {
                if let TurnEvent::ToolStarted { name, .. } = event {
                    spinner.set_message(format!("Running {}...", name));
                }
            })
            .await;
        spinner.finish_and_clear();
        result
    };

    session.shutdown().await;

    match result {
        Ok(response) => {
            if !stream {
                println!("\n{}\n", response.content);
            }

            if !response.tool_calls.is_empty() {
                Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
                for call in &response.tool_calls {
                    let marker = if call.is_error { " (failed)" } else { "" };
                    Output::list_item(&format!("{}{}", truncate(&call.to_string(), 80), marker));
                }
                println!();
            }

            Output::info(&format!("Completed in {} hop(s)", response.hops));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Agent failed: {}", e));
            Err(e.into())
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
