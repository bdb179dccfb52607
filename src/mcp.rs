use anyhow::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::prompts;
use crate::tools::{SERVER_NAME, ToolService, tool_definitions};

const STATUS_URI: &str = "aipic://status";
const SAMPLE_PROMPTS_URI: &str = "aipic://sample-prompts";

pub async fn run_mcp(service: Arc<ToolService>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin).lines();
    let mut writer = stdout;

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(value) = handle_line(&line, &service).await {
            let payload = serde_json::to_vec(&value)?;
            writer.write_all(&payload).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    debug!("mcp: stdin closed");

    Ok(())
}

/// Handle one JSON-RPC message. Notifications produce no response.
pub async fn handle_line(line: &str, service: &ToolService) -> Option<Value> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            return Some(jsonrpc_error(
                None,
                -32700,
                &format!("parse error: {}", err),
            ));
        }
    };
    let id = value.get("id").cloned();
    let method = match value.get("method").and_then(|method| method.as_str()) {
        Some(method) => method,
        None => return Some(jsonrpc_error(id, -32600, "invalid request")),
    };
    let params = value.get("params").cloned().unwrap_or_else(|| json!({}));
    debug!("mcp: {}", method);

    match method {
        "initialize" => Some(jsonrpc_response(id, initialize_result(&params))),
        "tools/list" => Some(jsonrpc_response(
            id,
            json!({ "tools": tool_definitions() }),
        )),
        "tools/call" => Some(jsonrpc_response(
            id,
            tools_call_result(params, service).await,
        )),
        "resources/list" => Some(jsonrpc_response(id, resources_list_result())),
        "resources/read" => {
            let uri = params
                .get("uri")
                .and_then(|value| value.as_str())
                .unwrap_or("");
            match read_resource(uri, service).await {
                Some(result) => Some(jsonrpc_response(id, result)),
                None => Some(jsonrpc_error(
                    id,
                    -32602,
                    &format!("unknown resource: {}", uri),
                )),
            }
        }
        "prompts/list" => Some(jsonrpc_response(id, json!({ "prompts": [] }))),
        "prompts/get" => Some(jsonrpc_error(id, -32601, "prompts not supported")),
        "ping" => Some(jsonrpc_response(id, json!({}))),
        "initialized" | "notifications/initialized" | "notifications/cancelled" => None,
        _ => Some(jsonrpc_error(id, -32601, "method not found")),
    }
}

fn initialize_result(params: &Value) -> Value {
    let requested = params
        .get("protocolVersion")
        .and_then(|value| value.as_str())
        .unwrap_or("unknown");
    json!({
        "protocolVersion": requested,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

async fn tools_call_result(params: Value, service: &ToolService) -> Value {
    let name = params
        .get("name")
        .and_then(|value| value.as_str())
        .unwrap_or("");
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    match service.call(name, arguments).await {
        Ok(output) => {
            let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
            json!({
                "content": [
                    {
                        "type": "text",
                        "text": text
                    }
                ]
            })
        }
        Err(err) => {
            warn!("tool {} failed: {}", name, err);
            tool_error(&err.to_string())
        }
    }
}

fn resources_list_result() -> Value {
    json!({
        "resources": [
            {
                "uri": STATUS_URI,
                "name": "Server status",
                "description": "Configuration state and available services.",
                "mimeType": "application/json"
            },
            {
                "uri": SAMPLE_PROMPTS_URI,
                "name": "Sample prompts",
                "description": "Example English image prompts.",
                "mimeType": "application/json"
            }
        ]
    })
}

async fn read_resource(uri: &str, service: &ToolService) -> Option<Value> {
    let body = match uri {
        STATUS_URI => service.status().await,
        SAMPLE_PROMPTS_URI => json!({ "prompts": prompts::sample_prompts() }),
        _ => return None,
    };
    let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
    Some(json!({
        "contents": [
            {
                "uri": uri,
                "mimeType": "application/json",
                "text": text
            }
        ]
    }))
}

fn jsonrpc_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn jsonrpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

fn tool_error(message: &str) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": message
            }
        ],
        "isError": true
    })
}
