use quay_mcp_protocol::{content::Content, messages::CallToolResult, tool::ToolError};
use std::fmt;

/// Conversion from whatever a tool closure returns into a [`CallToolResult`].
///
/// Implemented for strings, numbers, `bool`, `()`, `Vec<Content>`, `CallToolResult` itself, and
/// `Result`s of those. You can implement it for your own types to return images or structured
/// content without building `Content` in every handler.
///
/// Returning `Err` is fine: the server turns any `ToolError` into a result flagged with
/// `isError`, so the client sees the message rather than a JSON-RPC error.
pub trait IntoCallToolResult {
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError>;
}

fn text_result(text: String) -> Result<CallToolResult, ToolError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

macro_rules! impl_into_call_tool_result_for_to_string {
    ($($t:ty),*) => {
        $(
            impl IntoCallToolResult for $t {
                fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
                    text_result(self.to_string())
                }
            }
        )*
    };
}

impl_into_call_tool_result_for_to_string!(
    String, &'static str, i8, u8, i16, u16, i32, u32, i64, u64, isize, usize, f32, f64, bool
);

impl IntoCallToolResult for CallToolResult {
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        Ok(self)
    }
}

impl IntoCallToolResult for Vec<Content> {
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        Ok(CallToolResult::success(self))
    }
}

impl IntoCallToolResult for Content {
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        Ok(CallToolResult::success(vec![self]))
    }
}

impl IntoCallToolResult for () {
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        Ok(CallToolResult::success(vec![]))
    }
}

impl<T> IntoCallToolResult for Result<T, ToolError>
where
    T: IntoCallToolResult,
{
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        self.and_then(IntoCallToolResult::into_call_tool_result)
    }
}

/// Lets a tool closure use `?` on anything that converts into a `String`-ish message, without
/// defining its own error type.
impl<T> IntoCallToolResult for Result<T, DisplayableError>
where
    T: IntoCallToolResult,
{
    fn into_call_tool_result(self) -> Result<CallToolResult, ToolError> {
        match self {
            Ok(value) => value.into_call_tool_result(),
            Err(err) => Err(ToolError::Execution(err.0)),
        }
    }
}

#[derive(Debug)]
pub struct DisplayableError(String);

impl fmt::Display for DisplayableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<E: Into<String>> From<E> for DisplayableError {
    fn from(err: E) -> Self {
        DisplayableError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_become_text() {
        let result = 5i64.into_call_tool_result().unwrap();
        assert_eq!(result.content, vec![Content::text("5")]);

        let result = true.into_call_tool_result().unwrap();
        assert_eq!(result.content, vec![Content::text("true")]);

        let result = ().into_call_tool_result().unwrap();
        assert!(result.content.is_empty());
        assert!(!result.is_error);
    }

    #[test]
    fn errors_pass_through() {
        let result: Result<String, ToolError> = Err(ToolError::execution("division by zero"));
        assert_eq!(
            result.into_call_tool_result(),
            Err(ToolError::Execution("division by zero".into()))
        );

        let result: Result<u32, DisplayableError> = Err("bad input".into());
        assert_eq!(
            result.into_call_tool_result(),
            Err(ToolError::Execution("bad input".into()))
        );
    }
}
