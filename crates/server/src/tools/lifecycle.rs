//! install, activate, message and status tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{LifecycleController, LifecycleState, MessageOutcome};

use super::json_result;
use crate::host::ServerHost;

/// Parameters for the message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// Payload posted by a client, e.g. `{"type": "SKIP_WAITING"}`.
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOutput {
    pub outcome: MessageOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub state: LifecycleState,
    pub shell_store: String,
    pub runtime_store: String,
    pub skip_waiting: bool,
    pub open_clients: Vec<String>,
    pub claimed_clients: Vec<String>,
    pub pending_writes: usize,
}

pub async fn install_impl(controller: &LifecycleController) -> Result<CallToolResult, McpError> {
    let report = controller.on_install().await?;
    json_result(&report)
}

pub async fn activate_impl(controller: &LifecycleController) -> Result<CallToolResult, McpError> {
    let report = controller.on_activate().await?;
    json_result(&report)
}

pub async fn message_impl(controller: &LifecycleController, params: MessageParams) -> Result<CallToolResult, McpError> {
    let outcome = controller.on_control_message(&params.payload).await;
    json_result(&MessageOutput { outcome })
}

pub async fn status_impl(controller: &LifecycleController, host: &ServerHost) -> Result<CallToolResult, McpError> {
    let generations = controller.generations();
    let output = StatusOutput {
        state: controller.state().await,
        shell_store: generations.shell_store.clone(),
        runtime_store: generations.runtime_store.clone(),
        skip_waiting: host.skip_waiting_requested(),
        open_clients: host.open_clients().await,
        claimed_clients: host.claimed_clients().await,
        pending_writes: controller.router().pending_writes(),
    };
    json_result(&output)
}
