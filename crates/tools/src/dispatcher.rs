use serde::Serialize;
use teamskills_core::{PrivacyConfig, Result};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::ToolRegistry;
use crate::stream::StreamEvent;
use crate::types::{ToolCall, ToolResult};

/// Error text of a call abandoned through its cancellation token
pub const CANCELLED: &str = "cancelled";

/// Tools currently offered to the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    pub available: bool,
    pub tools: Vec<String>,
}

/// Executes tool calls from the agent
///
/// The dispatcher is responsible for:
/// - Finding the tool in the registry
/// - Executing it, optionally under a cancellation token
/// - Reporting progress as [StreamEvent]s
pub struct ToolDispatcher {
    registry: ToolRegistry,
    privacy: PrivacyConfig,
}

impl ToolDispatcher {
    /// Creates a new dispatcher with the given registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry, privacy: PrivacyConfig::default() }
    }

    /// Controls how arguments and output appear in logs
    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    /// Executes a single tool call
    #[instrument(skip(self, tool_call), fields(tool = %tool_call.name(), call_id = %tool_call.id))]
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        if self.privacy.log_tool_args {
            tracing::info!(args = %tool_call.arguments(), "Executing tool");
        } else {
            tracing::info!("Executing tool");
        }

        let result =
            self.registry.execute(tool_call.name(), tool_call.id.clone(), tool_call.arguments()).await;

        match &result {
            Ok(tool_result) => {
                if let Some(output) = self.privacy.render_output(tool_result.text()) {
                    tracing::debug!(success = tool_result.is_success(), output = %output, "Tool finished");
                } else {
                    tracing::debug!(success = tool_result.is_success(), "Tool finished");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Tool failed"),
        }

        result
    }

    /// Executes multiple tool calls in order
    ///
    /// Returns a vector of results, one for each tool call. Stops at the first `Err`.
    pub async fn execute_batch(&self, tool_calls: &[ToolCall]) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for tool_call in tool_calls {
            let result = self.execute(tool_call).await?;
            results.push(result);
        }

        Ok(results)
    }

    /// Executes a call unless `token` is cancelled first
    ///
    /// Cancellation drops the in-flight query and yields an error result
    /// carrying [CANCELLED].
    pub async fn execute_cancellable(&self, tool_call: &ToolCall, token: &CancellationToken) -> Result<ToolResult> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!(tool = %tool_call.name(), call_id = %tool_call.id, "Tool call cancelled");
                Ok(ToolResult::error(tool_call.id.clone(), CANCELLED))
            }
            result = self.execute(tool_call) => result,
        }
    }

    /// Executes a call, reporting `tool_call` then `tool_result` (or `error`) events
    ///
    /// A dropped receiver does not stop execution.
    pub async fn execute_with_events(
        &self, tool_call: &ToolCall, events: &UnboundedSender<StreamEvent>, token: &CancellationToken,
    ) -> Result<ToolResult> {
        emit(events, StreamEvent::tool_call(tool_call));

        match self.execute_cancellable(tool_call, token).await {
            Ok(result) => {
                emit(events, StreamEvent::tool_result(tool_call.name(), &result));
                Ok(result)
            }
            Err(e) => {
                emit(events, StreamEvent::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Runs `tool_calls` in order as one stream, finishing with `done`
    ///
    /// Each tool's text is also sent as `content`. A failing call ends the
    /// stream with an `error` event instead of `done`; so does cancellation.
    pub async fn stream(
        &self, tool_calls: &[ToolCall], events: UnboundedSender<StreamEvent>, token: CancellationToken,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for tool_call in tool_calls {
            if token.is_cancelled() {
                emit(&events, StreamEvent::error(CANCELLED));
                return results;
            }

            match self.execute_with_events(tool_call, &events, &token).await {
                Ok(result) if result.is_error() && token.is_cancelled() => {
                    emit(&events, StreamEvent::error(CANCELLED));
                    results.push(result);
                    return results;
                }
                Ok(result) => {
                    if result.is_success() {
                        emit(&events, StreamEvent::content(result.content.clone()));
                    }
                    results.push(result);
                }
                Err(_) => return results,
            }
        }

        emit(&events, StreamEvent::Done);
        results
    }

    /// Names of the tools on offer
    pub fn status(&self) -> AgentStatus {
        let tools = self.registry.list();
        AgentStatus { available: !tools.is_empty(), tools }
    }

    /// Gets a reference to the underlying registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl From<ToolRegistry> for ToolDispatcher {
    fn from(registry: ToolRegistry) -> Self {
        Self::new(registry)
    }
}

fn emit(events: &UnboundedSender<StreamEvent>, event: StreamEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Event receiver dropped");
    }
}
