//! Action parser — reads the textual tool-call protocol out of model replies.
//!
//! A reply asks for a tool when it contains both `Action:` and `PAUSE`, with
//! a JSON object between them:
//!
//! ```text
//! Thought: I should check the weather.
//! Action:
//! {"function_name": "get_weather", "function_params": {"city": "London"}}
//! PAUSE
//! ```
//!
//! Anything else is treated as the final answer.

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const THOUGHT_MARKER: &str = "Thought:";
pub const ACTION_MARKER: &str = "Action:";
pub const PAUSE_MARKER: &str = "PAUSE";
pub const OBSERVATION_MARKER: &str = "Observation:";
pub const ANSWER_MARKER: &str = "Answer:";

static ACTION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)Action:\s*(\{.*?\})\s*PAUSE").ok());

static LEADING_THOUGHT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^Thought:.*?\n\n").ok());

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub params: Map<String, Value>,
}

impl Action {
    /// Canonical form of this action: keys sorted at every depth, no
    /// whitespace. Formatting differences in the model's JSON do not change
    /// the key.
    pub fn key(&self) -> String {
        let mut root = Map::new();
        root.insert("function_name".into(), Value::String(self.name.clone()));
        root.insert("function_params".into(), Value::Object(self.params.clone()));
        let mut out = String::new();
        write_canonical(&Value::Object(root), &mut out);
        out
    }

    pub fn params_value(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// How a model reply should be handled.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// No tool requested; the reply is the final answer.
    NoAction,
    /// A well-formed tool request.
    ToolRequest(Action),
    /// The reply asked for a tool but the payload could not be read.
    ParseFailure(String),
}

/// Classify a model reply.
pub fn parse_reply(text: &str) -> ParsedReply {
    if !(text.contains(ACTION_MARKER) && text.contains(PAUSE_MARKER)) {
        return ParsedReply::NoAction;
    }

    let Some(payload) = ACTION_RE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    else {
        return ParsedReply::ParseFailure("no JSON object between Action: and PAUSE".into());
    };

    let value: Value = match serde_json::from_str(payload.as_str()) {
        Ok(v) => v,
        Err(e) => return ParsedReply::ParseFailure(format!("invalid action JSON: {e}")),
    };

    let Some(name) = value.get("function_name").and_then(Value::as_str) else {
        return ParsedReply::ParseFailure("missing string field 'function_name'".into());
    };

    let params = match value.get("function_params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return ParsedReply::ParseFailure("'function_params' must be an object".into());
        }
    };

    ParsedReply::ToolRequest(Action {
        name: name.to_string(),
        params,
    })
}

/// Extract the user-facing answer from a reply that requested no tool.
pub fn final_answer(text: &str) -> String {
    if let Some((_, after)) = text.split_once(ANSWER_MARKER) {
        return after.trim().to_string();
    }

    let stripped = match LEADING_THOUGHT_RE.as_ref() {
        Some(re) => re.replace(text, ""),
        None => text.into(),
    };
    let stripped = stripped.trim();
    if !stripped.is_empty() {
        return stripped.to_string();
    }

    text.replace(THOUGHT_MARKER, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(reply: &str) -> Action {
        match parse_reply(reply) {
            ParsedReply::ToolRequest(a) => a,
            other => panic!("expected tool request, got {other:?}"),
        }
    }

    #[test]
    fn plain_answer_is_no_action() {
        assert_eq!(parse_reply("Answer: Paris"), ParsedReply::NoAction);
        // Both markers are required.
        assert_eq!(
            parse_reply("Action: {\"function_name\": \"calculate\"}"),
            ParsedReply::NoAction
        );
    }

    #[test]
    fn multiline_action() {
        let a = action(
            "Thought: check it\nAction:\n{\n  \"function_name\": \"get_weather\",\n  \
             \"function_params\": {\"city\": \"London\"}\n}\nPAUSE",
        );
        assert_eq!(a.name, "get_weather");
        assert_eq!(a.params["city"], "London");
    }

    #[test]
    fn missing_params_default_to_empty() {
        let a = action("Action: {\"function_name\": \"calculate\"} PAUSE");
        assert!(a.params.is_empty());
    }

    #[test]
    fn invalid_payloads_are_parse_failures() {
        for reply in [
            "Action: not json PAUSE",
            "Action: {bad json} PAUSE",
            "Action: {\"function_params\": {}} PAUSE",
            "Action: {\"function_name\": 42} PAUSE",
            "Action: {\"function_name\": \"x\", \"function_params\": [1]} PAUSE",
        ] {
            assert!(
                matches!(parse_reply(reply), ParsedReply::ParseFailure(_)),
                "{reply} should fail"
            );
        }
    }

    #[test]
    fn key_ignores_formatting_and_key_order() {
        let a = action(
            "Action: {\"function_params\": {\"b\": 2, \"a\": {\"y\": 1, \"x\": [3, 4]}}, \
             \"function_name\": \"calculate\"} PAUSE",
        );
        let b = action(
            "Action:\n{\n \"function_name\":\"calculate\",\n \"function_params\":\n  \
             {\"a\": {\"x\": [3,4], \"y\": 1}, \"b\": 2}\n}\nPAUSE",
        );
        assert_eq!(a.key(), b.key());
        assert_eq!(
            a.key(),
            r#"{"function_name":"calculate","function_params":{"a":{"x":[3,4],"y":1},"b":2}}"#
        );
    }

    #[test]
    fn key_distinguishes_params() {
        let a = action("Action: {\"function_name\": \"calculate\", \"function_params\": {\"expression\": \"1+1\"}} PAUSE");
        let b = action("Action: {\"function_name\": \"calculate\", \"function_params\": {\"expression\": \"1+2\"}} PAUSE");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn final_answer_after_marker() {
        assert_eq!(
            final_answer("Thought: easy.\nAnswer:  Paris is the capital.  "),
            "Paris is the capital."
        );
        assert_eq!(final_answer("Answer: a Answer: b"), "a Answer: b");
    }

    #[test]
    fn final_answer_strips_leading_thought_block() {
        assert_eq!(
            final_answer("Thought: greeting\n\nHello there!"),
            "Hello there!"
        );
        assert_eq!(final_answer("Just text"), "Just text");
    }

    #[test]
    fn final_answer_with_only_a_thought() {
        assert_eq!(final_answer("Thought: hmm\n\n"), "hmm");
    }
}
