/// Extracts a JSON value from a role agent's free-form text response.
/// Tries, in order: a fenced ` ```json ` block, then a generic fenced code
/// block, then a brace/bracket-depth scan over the whole text that respects
/// quoted strings and escapes. Returns `None` if nothing balances.
///
/// Idempotent: re-running this on its own output (which is just the
/// extracted JSON text) returns the same text unchanged, since a bare JSON
/// document is itself a valid brace/bracket-balanced span.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(fenced) = extract_fenced(text, "```json") {
        return Some(fenced);
    }
    if let Some(fenced) = extract_fenced(text, "```") {
        return Some(fenced);
    }
    extract_balanced(text)
}

fn extract_fenced<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let candidate = rest[..end].trim();
    if candidate.is_empty() { None } else { Some(candidate) }
}

fn extract_balanced(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| *b == b'{' || *b == b'[')?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match *byte {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a role agent's response into a typed JSON-schema-contracted
/// result, extracting a JSON span first if the model wrapped it in prose or
/// a fence.
pub fn parse_contracted<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let candidate = extract_json(text).unwrap_or(text);
    serde_json::from_str(candidate)
}
