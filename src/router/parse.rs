//! Lenient extraction of a [`ToolCall`] from model output.
//!
//! Models often wrap JSON in Markdown fences despite being told not to.  Every
//! ```` ```json ```` and ```` ``` ```` delimiter is removed, the rest is trimmed
//! and decoded strictly.  Anything that does not decode is "no tool call".

use crate::tool::ToolCall;

/// Remove Markdown code fences anywhere in `reply` and trim.
pub fn strip_fences(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode the model reply, `None` when it is not a tool-call object.
pub fn parse_tool_call(reply: &str) -> Option<ToolCall> {
    let cleaned = strip_fences(reply);
    match serde_json::from_str::<ToolCall>(&cleaned) {
        Ok(call) => Some(call),
        Err(e) => {
            log::warn!("router: reply is not a tool call ({e}): {cleaned:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolArguments;

    #[test]
    fn fenced_json_reply_parses() {
        let reply = "```json\n{\"tool_name\":\"type\",\"tool_arguments\":\"hello\"}\n```";
        assert_eq!(parse_tool_call(reply), Some(ToolCall::text("type", "hello")));
    }

    #[test]
    fn plain_fence_and_whitespace_are_removed() {
        let reply = "  ```\n{\"tool_name\":\"spotify\",\"tool_arguments\":{\"action\":\"pause\"}}```  ";
        let call = parse_tool_call(reply).unwrap();
        assert_eq!(call.tool_name, "spotify");
        assert_eq!(call.tool_arguments, ToolArguments::Text("pause".into()));
    }

    #[test]
    fn prose_is_no_call() {
        assert_eq!(parse_tool_call("Sure! I'll open Notes for you."), None);
        assert_eq!(parse_tool_call(""), None);
    }

    #[test]
    fn trailing_prose_after_json_is_no_call() {
        assert_eq!(
            parse_tool_call("{\"tool_name\":\"type\",\"tool_arguments\":\"x\"} done"),
            None
        );
    }
}
