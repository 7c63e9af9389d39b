//! Interactive chat command.

use super::open_session;
use crate::agent::Session;
use crate::cli::{Output, TurnRenderer};
use crate::config::Settings;
use crate::llm::ResponseMode;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What to do with one line of user input.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Skip,
    Quit,
    Clear,
    Prompt(&'a str),
}

fn classify(line: &str) -> ChatInput<'_> {
    let input = line.trim();
    if input.is_empty() {
        ChatInput::Skip
    } else if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        ChatInput::Quit
    } else if input.eq_ignore_ascii_case("clear") {
        ChatInput::Clear
    } else {
        ChatInput::Prompt(input)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(
    thread: Option<String>,
    model: Option<String>,
    no_stream: bool,
    settings: Settings,
) -> Result<()> {
    let mode = if no_stream {
        ResponseMode::Complete
    } else {
        ResponseMode::Stream
    };
    let session = open_session(&settings, model, mode).await?;
    let thread_id = thread.unwrap_or_else(|| settings.agent.thread_id.clone());

    let result = chat_loop(&session, &thread_id).await;
    session.shutdown().await;
    result
}

async fn chat_loop(session: &Session, thread_id: &str) -> Result<()> {
    let agent = session.agent();

    println!("\n{}", style("taskloop chat").bold().cyan());
    println!(
        "{}",
        style(format!(
            "Model {} with {} tools. Thread: {}",
            agent.model_name(),
            session.tools().len(),
            thread_id
        ))
        .dim()
    );
    println!(
        "{}\n",
        style("Type your requests, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            Output::info("Goodbye!");
            break;
        }

        match classify(&line) {
            ChatInput::Skip => continue,
            ChatInput::Quit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                agent.store().clear(thread_id).await?;
                Output::info("Conversation history cleared.");
            }
            ChatInput::Prompt(input) => {
                let mut renderer = TurnRenderer::stdout("Assistant");
                if let Err(e) = agent.run_turn(thread_id, input, |event| renderer.render(event)).await {
                    Output::error(&format!("Error: {}", e));
                }
            }
        }
    }

    Ok(())
}
