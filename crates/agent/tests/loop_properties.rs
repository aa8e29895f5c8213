//! End-to-end properties of the grading loop against a scripted backend.

use async_trait::async_trait;
use gradepilot_agent::{GradingLoop, StreamEvent};
use gradepilot_core::backend::{BackendRequest, BackendResponse, ModelBackend};
use gradepilot_core::error::{BackendError, ToolError};
use gradepilot_core::message::ContentBlock;
use gradepilot_core::task::{LoopRequest, TaskType};
use gradepilot_tools::{catalog, complete_task, Tool, ToolContext, ToolOutput, ToolRegistry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Replays a fixed script of responses; repeats the last one if the loop
/// asks for more turns than scripted.
struct ScriptedBackend {
    script: Mutex<Vec<BackendResponse>>,
    cursor: AtomicU32,
    calls: AtomicU32,
}

impl ScriptedBackend {
    fn new(script: Vec<BackendResponse>) -> Self {
        Self {
            script: Mutex::new(script),
            cursor: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap();
        let i = self.cursor.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(script[i.min(script.len() - 1)].clone())
    }
}

/// Always fails at the transport level.
struct FailingBackend;

#[async_trait]
impl ModelBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        Err(BackendError::Network("connection refused".into()))
    }
}

/// Never answers.
struct HangingBackend;

#[async_trait]
impl ModelBackend for HangingBackend {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(text_turn("never"))
    }
}

/// A stub handler that counts dispatches and returns a fixed payload.
struct CountingTool {
    name: &'static str,
    dispatches: Arc<AtomicU32>,
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        Ok(ToolOutput::text(r#"{"courses":[]}"#))
    }
}

fn text_turn(text: &str) -> BackendResponse {
    BackendResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: Some("end_turn".into()),
    }
}

fn tool_turn(calls: &[(&str, &str)]) -> BackendResponse {
    BackendResponse {
        content: calls
            .iter()
            .map(|(id, name)| ContentBlock::ToolCall {
                id: (*id).into(),
                name: (*name).into(),
                input: serde_json::json!({}),
            })
            .collect(),
        stop_reason: Some("tool_use".into()),
    }
}

/// Registry with the real catalog and completion tool, plus a counting stub
/// for `fetch_courses`.
fn test_registry(dispatches: Arc<AtomicU32>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(catalog());
    registry.register(Box::new(complete_task::CompleteTaskTool));
    registry.register(Box::new(CountingTool {
        name: "fetch_courses",
        dispatches,
    }));
    Arc::new(registry)
}

fn grading_loop(backend: Arc<dyn ModelBackend>, registry: Arc<ToolRegistry>) -> GradingLoop {
    GradingLoop::new(backend, "test-model", registry)
}

#[tokio::test]
async fn p1_text_only_first_turn_terminates() {
    let backend = Arc::new(ScriptedBackend::new(vec![BackendResponse {
        content: vec![ContentBlock::text("Here is "), ContentBlock::text("the plan.")],
        stop_reason: Some("end_turn".into()),
    }]));
    let registry = test_registry(Arc::default());

    let result = grading_loop(backend, registry)
        .run(LoopRequest::new(TaskType::Custom, "hello"))
        .await;

    assert!(result.success);
    assert_eq!(result.result, "Here is the plan.");
    assert_eq!(result.iterations, 1);
    assert!(result.tools_used.is_empty());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn p2_tool_turn_then_text_turn() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_turn(&[("call_1", "fetch_courses")]),
        text_turn("You have one course."),
    ]));
    let dispatches = Arc::new(AtomicU32::new(0));
    let registry = test_registry(dispatches.clone());

    let result = grading_loop(backend, registry)
        .run(LoopRequest::new(TaskType::Custom, "what courses?"))
        .await;

    assert!(result.success);
    assert_eq!(result.result, "You have one course.");
    assert_eq!(result.tools_used, vec!["fetch_courses"]);
    assert_eq!(result.iterations, 2);
    assert_eq!(dispatches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn p3_completion_tool_short_circuits() {
    let backend = Arc::new(ScriptedBackend::new(vec![BackendResponse {
        content: vec![ContentBlock::ToolCall {
            id: "call_1".into(),
            name: "complete_task".into(),
            input: serde_json::json!({"success": "true", "notes": "done"}),
        }],
        stop_reason: Some("tool_use".into()),
    }]));
    let registry = test_registry(Arc::default());

    let mut request = LoopRequest::new(TaskType::PostGrades, "post them");
    request.max_iterations = Some(50);
    let result = grading_loop(backend, registry).run(request).await;

    assert!(result.success);
    assert_eq!(result.result, "done");
    assert_eq!(result.iterations, 1);
    assert_eq!(result.tools_used, vec!["complete_task"]);
}

#[tokio::test]
async fn completion_abandons_remaining_calls_in_turn() {
    let backend = Arc::new(ScriptedBackend::new(vec![BackendResponse {
        content: vec![
            ContentBlock::ToolCall {
                id: "call_1".into(),
                name: "complete_task".into(),
                input: serde_json::json!({"success": false, "notes": "cannot grade"}),
            },
            ContentBlock::ToolCall {
                id: "call_2".into(),
                name: "fetch_courses".into(),
                input: serde_json::json!({}),
            },
        ],
        stop_reason: Some("tool_use".into()),
    }]));
    let dispatches = Arc::new(AtomicU32::new(0));
    let registry = test_registry(dispatches.clone());

    let result = grading_loop(backend, registry)
        .run(LoopRequest::new(TaskType::Custom, "go"))
        .await;

    assert!(!result.success);
    assert_eq!(result.result, "cannot grade");
    // The second call in the turn is never dispatched or recorded.
    assert_eq!(result.tools_used, vec!["complete_task"]);
    assert_eq!(dispatches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn p4_iteration_bound_exhaustion() {
    // One scripted turn, repeated forever: always requests a tool.
    let backend = Arc::new(ScriptedBackend::new(vec![tool_turn(&[(
        "call_1",
        "fetch_courses",
    )])]));
    let registry = test_registry(Arc::default());

    let mut request = LoopRequest::new(TaskType::Custom, "loop forever");
    request.max_iterations = Some(3);
    let result = grading_loop(backend.clone(), registry).run(request).await;

    assert!(!result.success);
    assert_eq!(result.iterations, 3);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert!(result.error.as_deref().unwrap().contains("Max iterations"));
    assert_eq!(result.tools_used.len(), 3);
}

#[tokio::test]
async fn p5_unknown_tool_is_graceful() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_turn(&[("call_1", "summon_gradebook")]),
        text_turn("That tool does not exist, sorry."),
    ]));
    let registry = test_registry(Arc::default());

    let result = grading_loop(backend, registry)
        .run(LoopRequest::new(TaskType::Custom, "use a fake tool"))
        .await;

    // The loop survives the unknown tool and finishes on the next turn.
    assert!(result.success);
    assert_eq!(result.tools_used, vec!["summon_gradebook"]);
    assert_eq!(result.iterations, 2);
}

#[tokio::test]
async fn p6_streaming_event_order_matches_blocking_actions() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_turn(&[("call_1", "fetch_courses")]),
        text_turn("You have one course."),
    ]));
    let registry = test_registry(Arc::default());

    let mut rx = grading_loop(backend, registry)
        .run_stream(LoopRequest::new(TaskType::Custom, "what courses?"));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["tool_call", "tool_result", "text", "done"]);

    match &events[0] {
        StreamEvent::ToolCall { name, .. } => assert_eq!(name, "fetch_courses"),
        other => panic!("expected tool_call, got {other:?}"),
    }
    match &events[1] {
        StreamEvent::ToolResult { name, output } => {
            assert_eq!(name, "fetch_courses");
            assert!(output.contains("courses"));
        }
        other => panic!("expected tool_result, got {other:?}"),
    }
    match &events[3] {
        StreamEvent::Done {
            success,
            tools_used,
            iterations,
        } => {
            assert!(success);
            assert_eq!(tools_used, &vec!["fetch_courses".to_string()]);
            assert_eq!(*iterations, 2);
        }
        other => panic!("expected done, got {other:?}"),
    }
}

#[tokio::test]
async fn streaming_error_event_on_transport_failure() {
    let registry = test_registry(Arc::default());
    let mut rx = grading_loop(Arc::new(FailingBackend), registry)
        .run_stream(LoopRequest::new(TaskType::Custom, "hi"));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error {
            message,
            iterations,
            ..
        } => {
            assert!(message.contains("connection refused"));
            assert_eq!(*iterations, 1);
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_folds_into_result() {
    let registry = test_registry(Arc::default());
    let result = grading_loop(Arc::new(FailingBackend), registry)
        .run(LoopRequest::new(TaskType::Custom, "hi"))
        .await;

    assert!(!result.success);
    assert_eq!(result.result, "");
    assert_eq!(result.iterations, 1);
    assert!(result.error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn backend_call_times_out() {
    let registry = test_registry(Arc::default());
    let result = grading_loop(Arc::new(HangingBackend), registry)
        .run(LoopRequest::new(TaskType::Custom, "hi"))
        .await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn determinism_identical_runs_identical_results() {
    let script = vec![
        tool_turn(&[("call_1", "fetch_courses"), ("call_2", "fetch_courses")]),
        tool_turn(&[("call_3", "fetch_courses")]),
        text_turn("All done."),
    ];

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let backend = Arc::new(ScriptedBackend::new(script.clone()));
        let registry = test_registry(Arc::default());
        let result = grading_loop(backend, registry)
            .run(LoopRequest::new(TaskType::Custom, "go"))
            .await;
        outcomes.push(result);
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(
        outcomes[0].tools_used,
        vec!["fetch_courses", "fetch_courses", "fetch_courses"]
    );
    assert_eq!(outcomes[0].iterations, 3);
    assert_eq!(outcomes[0].result, "All done.");
}

#[tokio::test]
async fn dropping_the_receiver_cancels_the_invocation() {
    // Every turn requests a tool; without cancellation this would run all
    // ten default iterations.
    let backend = Arc::new(ScriptedBackend::new(vec![tool_turn(&[(
        "call_1",
        "fetch_courses",
    )])]));
    let dispatches = Arc::new(AtomicU32::new(0));
    let registry = test_registry(dispatches.clone());

    let mut rx = grading_loop(backend.clone(), registry)
        .run_stream(LoopRequest::new(TaskType::Custom, "go"));

    // Consume the first dispatch, then walk away.
    let first = rx.recv().await.unwrap();
    assert_eq!(first.event_type(), "tool_call");
    drop(rx);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // At most the in-flight turn finished; the loop never ran to the bound.
    assert!(backend.calls.load(Ordering::SeqCst) <= 2);
    assert!(dispatches.load(Ordering::SeqCst) <= 2);
}
