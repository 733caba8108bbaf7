//! E2E Scenario: MCP server over stdio
//!
//! Spawns `skillz serve` against a fixture root and drives a full session:
//! handshake, tool discovery, skill invocation, resource reads and shutdown.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{Value, json};
use skillz::test_utils::{SkillFixture, SkillSpec};

struct McpClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    request_id: u64,
}

impl McpClient {
    fn spawn(fixture: &SkillFixture) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_skillz"))
            .arg("--root")
            .arg(fixture.root())
            .args(["--quiet", "serve"])
            .env("HOME", fixture.temp_dir.path())
            .env("SKILLZ_USAGE_LOG", "0")
            .env_remove("SKILLZ_CONFIG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn MCP server");
        let stdin = child.stdin.take().expect("stdin is piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout is piped"));
        Self {
            child,
            stdin,
            stdout,
            request_id: 0,
        }
    }

    fn send(&mut self, message: &Value) {
        writeln!(self.stdin, "{message}").unwrap();
        self.stdin.flush().unwrap();
    }

    fn request(&mut self, method: &str, params: Value) -> Value {
        self.request_id += 1;
        let id = self.request_id;
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }));

        let mut line = String::new();
        self.stdout.read_line(&mut line).unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], id);
        response
    }

    fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let response = self.request("tools/call", json!({ "name": name, "arguments": arguments }));
        let text = response["result"]["content"][0]["text"].as_str().unwrap().to_string();
        println!("[MCP] {name} -> {text}");
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }

    fn shutdown(mut self) {
        let response = self.request("shutdown", json!({}));
        assert!(response["error"].is_null());
        drop(self.stdin);
        let status = self.child.wait().unwrap();
        assert!(status.success());
    }
}

fn fixture() -> SkillFixture {
    let fixture = SkillFixture::new();
    fixture.write_dir(
        &SkillSpec::new("Echo", "Repeat things back")
            .body("# Echo\n\nRepeat the task twice.\n")
            .file("notes.txt", "echo notes\n")
            .file("images/pixel.bin", [0x00_u8, 0xFF, 0x10]),
    );
    fixture.write_archive(
        &SkillSpec::new("Packed", "Lives in an archive").file("guide.md", "# Guide\n"),
        Some("packed"),
    );
    fixture
}

#[test]
fn test_mcp_session() {
    let fixture = fixture();
    let mut client = McpClient::spawn(&fixture);

    let init = client.request(
        "initialize",
        json!({ "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "e2e" } }),
    );
    assert_eq!(init["result"]["serverInfo"]["name"], "skillz");
    let instructions = init["result"]["instructions"].as_str().unwrap();
    assert!(instructions.contains("Echo"));
    assert!(instructions.contains("Packed"));

    // Notifications get no reply; the next response must belong to tools/list.
    client.send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }));

    let tools = client.request("tools/list", json!({}));
    let names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["list_skills", "get_skill", "fetch_resource", "run_script", "echo", "packed"]
    );

    let direct = client.call_tool("echo", json!({ "task": "say hi" }));
    assert_eq!(direct["skill"], "echo");

    let skills = client.call_tool("list_skills", json!({}));
    let slugs: Vec<&str> = skills
        .as_array()
        .unwrap()
        .iter()
        .map(|skill| skill["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["echo", "packed"]);

    let invocation = client.call_tool("get_skill", json!({ "slug": "echo", "task": "say hi" }));
    assert_eq!(invocation["task"], "say hi");
    assert!(invocation["instructions"].as_str().unwrap().contains("Repeat the task twice."));

    let fetched = client.call_tool("fetch_resource", json!({ "resource_uri": "resource://skillz/echo/notes.txt" }));
    assert_eq!(fetched["content"], "echo notes\n");

    let listed = client.request("resources/list", json!({}));
    let uris: Vec<&str> = listed["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|resource| resource["uri"].as_str().unwrap())
        .collect();
    assert!(uris.contains(&"resource://skillz/echo/images/pixel.bin"));
    assert!(uris.contains(&"resource://skillz/packed/guide.md"));

    let binary = client.request("resources/read", json!({ "uri": "resource://skillz/echo/images/pixel.bin" }));
    assert_eq!(binary["result"]["contents"][0]["blob"], "AP8Q");

    let archived = client.request("resources/read", json!({ "uri": "resource://skillz/packed/guide.md" }));
    assert_eq!(archived["result"]["contents"][0]["text"], "# Guide\n");

    let missing = client.call_tool("fetch_resource", json!({ "resource_uri": "resource://skillz/ghost/x.txt" }));
    assert_eq!(missing["error"], "skill_not_found");

    let unknown = client.request("no/such/method", json!({}));
    assert_eq!(unknown["error"]["code"], -32601);

    client.shutdown();
}

#[cfg(unix)]
#[test]
fn test_mcp_run_script() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Greeter", "Greets").script(
        "scripts/greet.sh",
        "#!/bin/sh\nprintf 'hello %s' \"$1\"\n",
    ));
    let mut client = McpClient::spawn(&fixture);
    client.request("initialize", json!({}));

    let result = client.call_tool(
        "run_script",
        json!({ "slug": "greeter", "path": "scripts/greet.sh", "args": ["world"], "timeout": 10 }),
    );
    assert_eq!(result["exit_code"], 0);
    assert_eq!(result["stdout"]["content"], "hello world");

    client.shutdown();
}
