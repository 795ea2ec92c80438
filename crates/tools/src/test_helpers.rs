//! Fakes shared by the unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use teamskills_core::{Error, Result};
use teamskills_store::{self as store, Param, QueryExecutor, Record};

use crate::Tool;
use crate::types::{ToolParameter, ToolResult};

/// A tool that always answers with the same text
#[derive(Debug)]
pub struct StaticTool {
    name: String,
    reply: String,
}

impl StaticTool {
    pub fn new(name: &str, reply: &str) -> Self {
        Self { name: name.to_string(), reply: reply.to_string() }
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Replies with fixed text"
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Ok(ToolResult::success(tool_call_id, self.reply.clone()))
    }
}

/// A tool that sleeps before answering
#[derive(Debug)]
pub struct SlowTool {
    name: String,
    delay: Duration,
}

impl SlowTool {
    pub fn new(name: &str, delay: Duration) -> Self {
        Self { name: name.to_string(), delay }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Sleeps, then replies"
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        tokio::time::sleep(self.delay).await;
        Ok(ToolResult::success(tool_call_id, "finished"))
    }
}

/// A tool whose execution always fails
#[derive(Debug)]
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, _tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Err(Error::tool("backend unavailable"))
    }
}

/// Executor that replays queued responses in order and records every query
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<store::Result<Vec<Record>>>>,
    calls: Mutex<Vec<(String, Vec<Param>)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(self, rows: Vec<Record>) -> Self {
        self.push(Ok(rows));
        self
    }

    pub fn failing(self) -> Self {
        self.push(Err(store::Error::database("connection refused")));
        self
    }

    fn push(&self, response: store::Result<Vec<Record>>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    fn next(&self, sql: &str, params: &[Param]) -> store::Result<Vec<Record>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((sql.to_string(), params.to_vec()));
        }
        self.responses.lock().ok().and_then(|mut r| r.pop_front()).unwrap_or(Ok(Vec::new()))
    }

    pub fn calls(&self) -> Vec<(String, Vec<Param>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn try_fetch_all(&self, sql: &str, params: &[Param]) -> store::Result<Vec<Record>> {
        self.next(sql, params)
    }

    async fn try_fetch_one(&self, sql: &str, params: &[Param]) -> store::Result<Option<Record>> {
        self.next(sql, params).map(|rows| rows.into_iter().next())
    }

    async fn is_connected(&self) -> bool {
        true
    }
}
