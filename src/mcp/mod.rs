//! MCP (Model Context Protocol) server over line-delimited stdio.
//!
//! Skills are exposed both as tools (`list_skills`, `get_skill`,
//! `fetch_resource`, `run_script`) and as MCP resources.

pub mod protocol;
mod tools;

use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::encoding::Encoding;
use crate::error::Result;
use crate::resource;
use crate::service::SkillService;
use protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND, PARSE_ERROR, ResourceContents, ResourceDescriptor,
};

pub use tools::{call_tool, define_tools, skill_tools};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "skillz";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct McpServer {
    service: SkillService,
}

impl McpServer {
    #[must_use]
    pub const fn new(service: SkillService) -> Self {
        Self { service }
    }

    /// Serve requests from stdin until it closes.
    pub fn serve_stdio(&self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serve one request per line from `reader`, replying on `writer`.
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        info!(
            server = SERVER_NAME,
            version = SERVER_VERSION,
            protocol = PROTOCOL_VERSION,
            skills = self.service.registry().len(),
            "MCP server listening on stdio"
        );

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "stdin read error");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            debug!(request = %line, "<-");

            let Some(response) = self.handle_line(&line) else {
                continue;
            };
            let encoded = serde_json::to_string(&response).or_else(|err| {
                serde_json::to_string(&JsonRpcResponse::error(
                    Some(response.id.clone()),
                    INTERNAL_ERROR,
                    format!("Failed to serialize response: {err}"),
                ))
            })?;
            debug!(response = %encoded, "->");

            if writeln!(writer, "{encoded}").is_err() {
                break;
            }
            writer.flush()?;
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one raw request line; `None` for notifications.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {err}")));
            }
        };
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        let notification = request.is_notification();
        let response = self.dispatch(request);
        if notification { None } else { Some(response) }
    }

    fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;
        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "notifications/initialized" | "initialized" | "ping" | "shutdown" => {
                JsonRpcResponse::success(id, json!({}))
            }
            "tools/list" => {
                let mut tools = define_tools();
                tools.extend(skill_tools(&self.service));
                to_response(id, &json!({ "tools": tools }))
            }
            "tools/call" => self.tools_call(id, &request.params),
            "resources/list" => self.resources_list(id),
            "resources/read" => self.resources_read(id, &request.params),
            method => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}")),
        }
    }

    fn initialize_result(&self) -> Value {
        let skills = self.service.registry().skills();
        let instructions = if skills.is_empty() {
            "No skills".to_string()
        } else {
            let names: Vec<&str> = skills.iter().map(|skill| skill.name()).collect();
            format!("Loaded skills: {}", names.join(", "))
        };
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
            },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
            "instructions": instructions,
        })
    }

    fn tools_call(&self, id: Option<Value>, params: &Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing required parameter: name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        debug!(tool = name, "Calling tool");
        to_response(id, &call_tool(&self.service, name, &arguments))
    }

    fn resources_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let resources: Vec<ResourceDescriptor> = self
            .service
            .registry()
            .skills()
            .iter()
            .flat_map(resource::entries)
            .map(|entry| ResourceDescriptor {
                uri: entry.uri,
                name: entry.name,
                mime_type: entry.mime_type,
            })
            .collect();
        to_response(id, &json!({ "resources": resources }))
    }

    fn resources_read(&self, id: Option<Value>, params: &Value) -> JsonRpcResponse {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing required parameter: uri");
        };
        let contents = match self.service.read_resource(uri) {
            Ok(content) => {
                let (text, blob) = match content.payload.encoding {
                    Encoding::Text => (Some(content.payload.content), None),
                    Encoding::Base64 => (None, Some(content.payload.content)),
                };
                ResourceContents {
                    uri: content.uri,
                    mime_type: content.mime_type,
                    text,
                    blob,
                }
            }
            Err(miss) => {
                let payload = miss.to_payload(uri);
                ResourceContents {
                    uri: payload.uri,
                    mime_type: Some(payload.mime_type.to_string()),
                    text: Some(payload.content),
                    blob: None,
                }
            }
        };
        to_response(id, &json!({ "contents": [contents] }))
    }
}

fn to_response<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Failed to encode result: {err}")),
    }
}
