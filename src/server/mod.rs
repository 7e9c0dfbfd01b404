//! Line-delimited JSON-RPC tool server.
//!
//! Reads one request per line and writes one response per line. Exposes a
//! single tool, `repfor`, whose arguments map onto a [`ReplaceRequest`].

pub mod protocol;

pub use protocol::{ErrorCode, ErrorObject, Request, Response, ToolCallParams};

use crate::error::Result;
use crate::replace::ReplaceRequest;
use serde_json::{Map, Value, json};
use std::io::{BufRead, Write};
use tracing::debug;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const TOOL_NAME: &str = "repfor";

/// A JSON-RPC server over any line reader and writer.
pub struct Server<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Server<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Serves requests until end of input.
    pub fn run(&mut self) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                debug!("end of input, stopping server");
                return Ok(());
            }

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = handle_line(line) {
                serde_json::to_writer(&mut self.writer, &response)?;
                self.writer.write_all(b"\n")?;
                self.writer.flush()?;
            }
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Handles one raw message line, returning the response to send, if any.
pub fn handle_line(line: &[u8]) -> Option<Response> {
    match serde_json::from_slice::<Request>(line) {
        Ok(request) => handle_request(request),
        Err(e) => {
            debug!("unparseable message: {}", e);
            Some(Response::failure(Value::Null, ErrorCode::ParseError.into()))
        }
    }
}

/// Dispatches a parsed request.
///
/// Notifications are executed like any other request, but get no response.
pub fn handle_request(request: Request) -> Option<Response> {
    let outcome = match request.method.as_str() {
        "initialize" => Ok(initialize_result()),
        "tools/list" => Ok(tools_list_result()),
        "tools/call" => call_tool(request.params),
        other => {
            debug!("unknown method {}", other);
            Err(ErrorCode::MethodNotFound.into())
        }
    };

    let Some(id) = request.id else {
        debug!("not answering notification {}", request.method);
        return None;
    };
    Some(match outcome {
        Ok(result) => Response::success(id, result),
        Err(error) => Response::failure(id, error),
    })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": TOOL_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "list": true, "call": true }
        }
    })
}

fn tools_list_result() -> Value {
    json!({
        "tools": [{
            "name": TOOL_NAME,
            "description": "Replace exact strings in files. Scans the given directories \
                (one level deep unless 'recursive' is set) or an explicit file list, \
                and rewrites matching files in place. Supports extension filtering, \
                case-insensitive and whole-word matching, line exclusion and dry runs.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file": {
                        "type": "array",
                        "description": "File paths to process (a single string is also accepted). Overrides 'dir'."
                    },
                    "dir": {
                        "type": "array",
                        "description": "Directories to scan (a single string is also accepted). Defaults to the current directory."
                    },
                    "search": {
                        "type": "string",
                        "description": "Exact text to find. A newline makes it a multi-line pattern."
                    },
                    "replace": {
                        "type": "string",
                        "description": "Replacement text. May be empty to delete matches."
                    },
                    "ext": {
                        "type": "string",
                        "description": "Only process files whose name ends with this suffix, e.g. '.go'."
                    },
                    "exclude": {
                        "type": "array",
                        "description": "Lines containing any of these strings are left untouched."
                    },
                    "case_insensitive": {
                        "type": "boolean",
                        "description": "Ignore case when matching.",
                        "default": false
                    },
                    "whole_word": {
                        "type": "boolean",
                        "description": "Only match whole words.",
                        "default": false
                    },
                    "dry_run": {
                        "type": "boolean",
                        "description": "Report what would change without writing.",
                        "default": false
                    },
                    "recursive": {
                        "type": "boolean",
                        "description": "Also scan subdirectories.",
                        "default": false
                    },
                    "diff": {
                        "type": "boolean",
                        "description": "Include a unified diff for each modified file.",
                        "default": false
                    }
                },
                "required": ["search", "replace"]
            }
        }]
    })
}

fn call_tool(params: Option<Value>) -> std::result::Result<Value, ErrorObject> {
    let params: ToolCallParams = serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|_| ErrorObject::from(ErrorCode::InvalidParams))?;
    if params.name != TOOL_NAME {
        return Err(ErrorObject::new(ErrorCode::InvalidParams, "Unknown tool"));
    }

    let request = request_from_arguments(&params.arguments.unwrap_or_default())?;
    let result = request.apply().map_err(|e| {
        ErrorObject::new(ErrorCode::InternalError, format!("Replacement failed: {e}"))
    })?;
    let text = serde_json::to_string(&result)
        .map_err(|_| ErrorObject::new(ErrorCode::InternalError, "Failed to marshal result"))?;

    Ok(json!({
        "content": [{ "type": "text", "text": text }]
    }))
}

/// Builds a request from `tools/call` arguments.
///
/// `search` and `replace` must be strings. Everything else is optional and
/// ignored when it has the wrong type.
pub fn request_from_arguments(
    args: &Map<String, Value>,
) -> std::result::Result<ReplaceRequest, ErrorObject> {
    let required = |key: &str| match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ErrorObject::new(
            ErrorCode::InvalidParams,
            format!("Missing or invalid '{key}' parameter"),
        )),
    };
    let search = required("search")?;
    let replace = required("replace")?;

    let flag = |key: &str| args.get(key).and_then(Value::as_bool).unwrap_or(false);

    let files = match args.get("file") {
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        other => string_list(other),
    };

    let mut request = ReplaceRequest::new(search, replace)
        .files(files)
        .directories(string_list(args.get("dir")))
        .case_insensitive(flag("case_insensitive"))
        .whole_word(flag("whole_word"))
        .dry_run(flag("dry_run"))
        .recursive(flag("recursive"))
        .diff(flag("diff"));

    if let Some(ext) = args.get("ext").and_then(Value::as_str) {
        request = request.extension(ext);
    }
    if let Some(Value::Array(items)) = args.get("exclude") {
        request = request.exclude(items.iter().filter_map(Value::as_str));
    }
    Ok(request)
}

/// Accepts a string or an array of strings; non-string items are dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn serve(input: &str) -> Vec<Value> {
        let mut server = Server::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        server.run().unwrap();
        String::from_utf8(server.into_writer())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn call(arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "repfor", "arguments": arguments }
        });
        let responses = serve(&format!("{request}\n"));
        responses.into_iter().next().unwrap()
    }

    fn tool_result(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_initialize() {
        let responses = serve(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);

        assert_eq!(responses.len(), 1);
        let result = &responses[0]["result"];
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "repfor");
        assert_eq!(result["capabilities"]["tools"]["call"], true);
        assert_eq!(responses[0]["id"], 1);
    }

    #[test]
    fn test_tools_list() {
        let responses = serve("{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"tools/list\"}\n");

        let tool = &responses[0]["result"]["tools"][0];
        assert_eq!(tool["name"], "repfor");
        assert_eq!(tool["inputSchema"]["required"], json!(["search", "replace"]));
        assert!(tool["inputSchema"]["properties"].get("whole_word").is_some());
        assert_eq!(responses[0]["id"], "a");
    }

    #[test]
    fn test_parse_error_and_blank_lines() {
        let responses = serve("\n   \nnot json\n");

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["error"]["message"], "Parse error");
    }

    #[test]
    fn test_method_not_found() {
        let responses = serve(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#);
        assert_eq!(responses[0]["error"]["code"], -32601);
        assert_eq!(responses[0]["error"]["message"], "Method not found");
    }

    #[test]
    fn test_notifications_get_no_response() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let responses = serve(input);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 2);
    }

    #[test]
    fn test_tool_call_notification_still_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "foo\n").unwrap();

        let call = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": TOOL_NAME,
                "arguments": { "file": path.to_str().unwrap(), "search": "foo", "replace": "bar" }
            }
        });
        let responses = serve(&call.to_string());

        assert!(responses.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "bar\n");
    }

    #[test]
    fn test_unknown_tool() {
        let input = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"grep","arguments":{}}}"#;
        let responses = serve(input);
        assert_eq!(responses[0]["error"]["code"], -32602);
        assert_eq!(responses[0]["error"]["message"], "Unknown tool");
    }

    #[test]
    fn test_missing_params() {
        let responses = serve(r#"{"jsonrpc":"2.0","id":1,"method":"tools/call"}"#);
        assert_eq!(responses[0]["error"]["message"], "Invalid params");
    }

    #[test]
    fn test_missing_search_and_replace() {
        let response = call(json!({ "replace": "x" }));
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(
            response["error"]["message"],
            "Missing or invalid 'search' parameter"
        );

        let response = call(json!({ "search": "x", "replace": 5 }));
        assert_eq!(
            response["error"]["message"],
            "Missing or invalid 'replace' parameter"
        );
    }

    #[test]
    fn test_call_replaces_in_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello world\n").unwrap();

        let response = call(json!({
            "dir": dir.path().to_str().unwrap(),
            "search": "hello",
            "replace": "hi"
        }));

        let result = tool_result(&response);
        assert_eq!(result["summary"], "Modified 1 file: 1 replacement in 1 line");
        assert_eq!(result["directories"][0]["files"][0]["path"], "a.txt");
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "hi world\n"
        );
    }

    #[test]
    fn test_call_dry_run_with_file_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "old old\n").unwrap();

        let response = call(json!({
            "file": [path.to_str().unwrap(), 42],
            "search": "old",
            "replace": "new",
            "dry_run": true,
            "diff": true
        }));

        let result = tool_result(&response);
        assert_eq!(result["dry_run"], true);
        assert_eq!(result["directories"][0]["dir"], "(files)");
        assert_eq!(result["directories"][0]["total_replacements"], 2);
        assert!(
            result["directories"][0]["files"][0]["diff"]
                .as_str()
                .unwrap()
                .contains("+new new")
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "old old\n");
    }

    #[test]
    fn test_call_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let response = call(json!({
            "dir": [dir.path().join("missing").to_str().unwrap()],
            "search": "a",
            "replace": "b"
        }));

        assert_eq!(response["error"]["code"], -32603);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Replacement failed: ")
        );
    }

    #[test]
    fn test_arguments_mapping() {
        let args = json!({
            "file": "",
            "dir": ["src", 1, "tests"],
            "search": "a",
            "replace": "",
            "ext": ".rs",
            "exclude": ["KEEP", null],
            "case_insensitive": true,
            "whole_word": "yes",
            "recursive": true
        });
        let request = request_from_arguments(args.as_object().unwrap()).unwrap();

        assert!(request.file_list().is_empty());
        assert_eq!(
            request.directory_list(),
            &[PathBuf::from("src"), PathBuf::from("tests")]
        );
        assert_eq!(request.exclude_patterns(), &["KEEP".to_string()]);
        assert_eq!(request.replacement(), "");
        assert!(request.mode().is_case_insensitive());
        assert!(!request.mode().is_whole_word());
    }
}
