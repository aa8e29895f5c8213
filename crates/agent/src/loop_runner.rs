//! The grading loop — bounded tool-calling against the model backend.
//!
//! Each iteration sends the briefing, the accumulated conversation, and the
//! tool catalog to the backend, then either returns (text-only turn,
//! completion signal, bound reached, transport failure) or dispatches the
//! requested tools in response order and loops.
//!
//! A single invocation is strictly sequential: one backend call at a time,
//! tool calls dispatched one after another in response order. All failures
//! fold into the returned `LoopResult`; callers never see a raised error
//! from this module.

use gradepilot_core::backend::{BackendRequest, BackendResponse, ModelBackend};
use gradepilot_core::error::BackendError;
use gradepilot_core::message::{ContentBlock, Message};
use gradepilot_core::task::{LoopRequest, LoopResult};
use gradepilot_tools::{complete_task, ToolContext, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::briefing::build_briefing;

pub(crate) const DEFAULT_MAX_ITERATIONS: u32 = 10;
pub(crate) const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);
pub(crate) const MAX_ITER_RESULT: &str = "max iterations exceeded";
pub(crate) const MAX_ITER_ERROR: &str = "Max iterations exceeded";

/// The grading loop. Construct once; `run` and `run_stream` may be called
/// concurrently from separate invocations — the backend and registry are
/// read-only after startup.
pub struct GradingLoop {
    pub(crate) backend: Arc<dyn ModelBackend>,
    pub(crate) model: String,
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) max_iterations: u32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) call_timeout: Option<Duration>,
}

impl GradingLoop {
    /// Create a new grading loop.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        model: impl Into<String>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: None,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }

    /// Set the default iteration bound (requests may override it).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per backend response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set or disable the per-backend-call timeout (default 120s).
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Run one blocking invocation to a terminal result.
    pub async fn run(&self, request: LoopRequest) -> LoopResult {
        let invocation_id = Uuid::new_v4();
        info!(
            invocation_id = %invocation_id,
            task = %request.task,
            "Starting grading loop"
        );

        let briefing = build_briefing(request.task, &request.session);
        let ctx = ToolContext {
            task: request.task,
            session: request.session.clone(),
        };
        let max_iterations = request.max_iterations.unwrap_or(self.max_iterations).max(1);
        let tools = self.registry.declarations().to_vec();

        let mut conversation = vec![initial_message(&request)];
        let mut tools_used: Vec<String> = Vec::new();
        let mut iterations: u32 = 0;

        while iterations < max_iterations {
            iterations += 1;
            debug!(invocation_id = %invocation_id, iteration = iterations, "Loop iteration");

            let backend_request = BackendRequest {
                model: self.model.clone(),
                system: briefing.clone(),
                messages: conversation.clone(),
                tools: tools.clone(),
                max_tokens: self.max_tokens,
            };

            let response = match call_backend(
                self.backend.as_ref(),
                &backend_request,
                self.call_timeout,
            )
            .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(invocation_id = %invocation_id, error = %e, "Backend call failed");
                    return LoopResult {
                        success: false,
                        result: String::new(),
                        tools_used,
                        iterations,
                        error: Some(e.to_string()),
                    };
                }
            };

            // Text-only turn: the model is done.
            if !response.has_tool_calls() {
                let text = joined_text(&response);
                info!(invocation_id = %invocation_id, iterations, "Loop done (text turn)");
                return LoopResult {
                    success: true,
                    result: text,
                    tools_used,
                    iterations,
                    error: None,
                };
            }

            let mut results: Vec<ContentBlock> = Vec::new();
            for block in &response.content {
                let ContentBlock::ToolCall { id, name, input } = block else {
                    continue;
                };
                tools_used.push(name.clone());
                debug!(invocation_id = %invocation_id, tool = %name, "Dispatching tool");
                let dispatch = self.registry.dispatch(name, input.clone(), &ctx).await;

                if dispatch.is_completion {
                    // Scripted short-circuit: any other tool calls in this
                    // turn are abandoned without a tool_result.
                    let (success, notes) = complete_task::parse_outcome(&dispatch.output);
                    info!(invocation_id = %invocation_id, success, iterations, "Loop done (completion signal)");
                    return LoopResult {
                        success,
                        result: notes,
                        tools_used,
                        iterations,
                        error: None,
                    };
                }

                results.push(ContentBlock::ToolResult {
                    call_id: id.clone(),
                    output: dispatch.output,
                });
            }

            // One assistant message with the raw blocks, one user message
            // with every collected result, in protocol order.
            conversation.push(Message::assistant(response.content));
            conversation.push(Message::user(results));
        }

        warn!(invocation_id = %invocation_id, iterations, "Iteration bound exhausted");
        LoopResult {
            success: false,
            result: MAX_ITER_RESULT.into(),
            tools_used,
            iterations,
            error: Some(MAX_ITER_ERROR.into()),
        }
    }
}

/// The initial user message: image blocks first, each followed by its label,
/// then the text block. Fixed presentation order.
pub(crate) fn initial_message(request: &LoopRequest) -> Message {
    let mut blocks = Vec::with_capacity(request.image_attachments.len() * 2 + 1);
    for (i, attachment) in request.image_attachments.iter().enumerate() {
        blocks.push(ContentBlock::Image {
            media_type: attachment.media_type.clone(),
            data: attachment.data.clone(),
        });
        blocks.push(ContentBlock::text(format!("Attachment {}", i + 1)));
    }
    blocks.push(ContentBlock::text(request.user_message.clone()));
    Message::user(blocks)
}

/// Concatenate the text blocks of a response in response order.
pub(crate) fn joined_text(response: &BackendResponse) -> String {
    response
        .content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

/// One backend call, bounded by the optional timeout. No retry.
pub(crate) async fn call_backend(
    backend: &dyn ModelBackend,
    request: &BackendRequest,
    timeout: Option<Duration>,
) -> Result<BackendResponse, BackendError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, backend.complete(request))
            .await
            .map_err(|_| {
                BackendError::Timeout(format!(
                    "backend call exceeded {}s",
                    limit.as_secs()
                ))
            })?,
        None => backend.complete(request).await,
    }
}
