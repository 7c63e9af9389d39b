//! Events emitted while a turn runs.

/// Progress of a turn, delivered in order.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Incremental model text. Never the final state of a turn.
    TextFragment(String),
    /// A tool call is about to run.
    ToolStarted {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// A tool call finished; its result has been appended to the history.
    ToolFinished {
        call_id: String,
        name: String,
        output: String,
        is_error: bool,
    },
    /// The model answered without tool calls. Always the last event of a successful turn.
    TurnComplete { content: String, hops: usize },
}
