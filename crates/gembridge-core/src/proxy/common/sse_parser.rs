/// Parse a single SSE line into (key, value) pair.
///
/// SSE format: `key: value\n`. A single leading space in the value is part
/// of the framing and is dropped.
pub fn parse_sse_line(line: &str) -> Option<(&str, &str)> {
    let colon_pos = line.find(':')?;
    let key = &line[..colon_pos];
    let value = &line[colon_pos + 1..];
    Some((key, value.strip_prefix(' ').unwrap_or(value)))
}

/// Encode one JSON payload as an SSE `data:` record.
pub fn sse_record(payload: &str) -> String {
    format!("data: {}\n\n", payload)
}

/// Terminal record of an OpenAI-style stream.
pub const SSE_DONE: &str = "data: [DONE]\n\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: {\"a\":1}"), Some(("data", "{\"a\":1}")));
        assert_eq!(parse_sse_line("data:{}"), Some(("data", "{}")));
        assert_eq!(parse_sse_line(": keepalive"), Some(("", "keepalive")));
        assert_eq!(parse_sse_line("garbage"), None);
    }
}
