//! Streaming adapter — the grading loop as an event sequence.
//!
//! Same control algorithm as the blocking loop, but every state transition
//! is emitted as a `StreamEvent`: `tool_call` immediately before dispatch,
//! `tool_result` immediately after, `text` per text block in a terminal
//! turn, then exactly one `done` or `error`. Consumers rely on this order to
//! render live progress.
//!
//! Cancellation is receiver-drop driven: the producer races the pending
//! backend call against channel closure and checks closure before each tool
//! dispatch, so abandoning the receiver stops the invocation promptly.

use gradepilot_core::backend::BackendRequest;
use gradepilot_core::message::{ContentBlock, Message};
use gradepilot_core::task::LoopRequest;
use gradepilot_tools::{complete_task, ToolContext};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::briefing::build_briefing;
use crate::loop_runner::{
    call_backend, initial_message, GradingLoop, MAX_ITER_ERROR,
};

/// Incremental signals emitted by the streaming loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A tool is about to be dispatched.
    ToolCall {
        name: String,
        input: serde_json::Value,
    },

    /// A tool dispatch finished.
    ToolResult { name: String, output: String },

    /// One text block of a terminal turn.
    Text { chunk: String },

    /// Terminal: the loop ended with an outcome.
    Done {
        success: bool,
        tools_used: Vec<String>,
        iterations: u32,
    },

    /// Terminal: the loop failed (transport error or bound exhaustion).
    Error {
        message: String,
        tools_used: Vec<String>,
        iterations: u32,
    },
}

impl StreamEvent {
    /// Wire name of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Text { .. } => "text",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Wrap an event receiver as a `Stream`.
pub fn into_stream(rx: mpsc::Receiver<StreamEvent>) -> ReceiverStream<StreamEvent> {
    ReceiverStream::new(rx)
}

impl GradingLoop {
    /// Run one invocation, emitting events instead of accumulating silently.
    ///
    /// The receiver yields the ordered event sequence, terminated by exactly
    /// one `done` or `error`. Dropping the receiver cancels the invocation.
    pub fn run_stream(&self, request: LoopRequest) -> mpsc::Receiver<StreamEvent> {
        // Capacity 1 keeps the producer consumer-paced: sends suspend until
        // the receiver reads, so a dropped receiver is noticed before the
        // next backend call or dispatch rather than after the buffer fills.
        let (tx, rx) = mpsc::channel::<StreamEvent>(1);

        let backend = self.backend.clone();
        let model = self.model.clone();
        let registry = self.registry.clone();
        let max_tokens = self.max_tokens;
        let call_timeout = self.call_timeout;
        let max_iterations = request.max_iterations.unwrap_or(self.max_iterations).max(1);

        tokio::spawn(async move {
            let invocation_id = Uuid::new_v4();
            info!(
                invocation_id = %invocation_id,
                task = %request.task,
                "Starting streaming grading loop"
            );

            let briefing = build_briefing(request.task, &request.session);
            let ctx = ToolContext {
                task: request.task,
                session: request.session.clone(),
            };
            let tools = registry.declarations().to_vec();

            let mut conversation = vec![initial_message(&request)];
            let mut tools_used: Vec<String> = Vec::new();
            let mut iterations: u32 = 0;

            while iterations < max_iterations {
                iterations += 1;

                let backend_request = BackendRequest {
                    model: model.clone(),
                    system: briefing.clone(),
                    messages: conversation.clone(),
                    tools: tools.clone(),
                    max_tokens,
                };

                let response = tokio::select! {
                    _ = tx.closed() => {
                        debug!(invocation_id = %invocation_id, "Consumer gone, cancelling");
                        return;
                    }
                    result = call_backend(backend.as_ref(), &backend_request, call_timeout) => {
                        match result {
                            Ok(r) => r,
                            Err(e) => {
                                warn!(invocation_id = %invocation_id, error = %e, "Backend call failed");
                                let _ = tx
                                    .send(StreamEvent::Error {
                                        message: e.to_string(),
                                        tools_used,
                                        iterations,
                                    })
                                    .await;
                                return;
                            }
                        }
                    }
                };

                if !response.has_tool_calls() {
                    for block in &response.content {
                        if let ContentBlock::Text { text } = block {
                            let _ = tx
                                .send(StreamEvent::Text {
                                    chunk: text.clone(),
                                })
                                .await;
                        }
                    }
                    let _ = tx
                        .send(StreamEvent::Done {
                            success: true,
                            tools_used,
                            iterations,
                        })
                        .await;
                    return;
                }

                let mut results: Vec<ContentBlock> = Vec::new();
                for block in &response.content {
                    let ContentBlock::ToolCall { id, name, input } = block else {
                        continue;
                    };
                    if tx.is_closed() {
                        debug!(invocation_id = %invocation_id, "Consumer gone, skipping dispatch");
                        return;
                    }

                    tools_used.push(name.clone());
                    let _ = tx
                        .send(StreamEvent::ToolCall {
                            name: name.clone(),
                            input: input.clone(),
                        })
                        .await;

                    let dispatch = registry.dispatch(name, input.clone(), &ctx).await;

                    if dispatch.is_completion {
                        // Same scripted short-circuit as the blocking mode:
                        // remaining calls in this turn are abandoned.
                        let (success, _notes) = complete_task::parse_outcome(&dispatch.output);
                        let _ = tx
                            .send(StreamEvent::Done {
                                success,
                                tools_used,
                                iterations,
                            })
                            .await;
                        return;
                    }

                    let _ = tx
                        .send(StreamEvent::ToolResult {
                            name: name.clone(),
                            output: dispatch.output.clone(),
                        })
                        .await;

                    results.push(ContentBlock::ToolResult {
                        call_id: id.clone(),
                        output: dispatch.output,
                    });
                }

                conversation.push(Message::assistant(response.content));
                conversation.push(Message::user(results));
            }

            warn!(invocation_id = %invocation_id, iterations, "Iteration bound exhausted");
            let _ = tx
                .send(StreamEvent::Error {
                    message: MAX_ITER_ERROR.into(),
                    tools_used,
                    iterations,
                })
                .await;
        });

        rx
    }
}
