use super::GeminiError;
use serde::Deserialize;
use std::io::BufRead;

#[derive(Debug, Default, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProviderError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ProviderError,
}

/// Text carried by one `data:` payload: the non-thought text parts of the
/// first candidate, concatenated.
pub fn fragment_from_payload(payload: &str) -> Result<String, GeminiError> {
    let chunk: StreamChunk =
        serde_json::from_str(payload).map_err(|e| GeminiError::Malformed(e.to_string()))?;
    if let Some(err) = chunk.error {
        return Err(GeminiError::Provider {
            code: err.code,
            message: err.message,
        });
    }
    let text = chunk
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();
    Ok(text)
}

/// Read a server-sent event stream and pass every non-empty fragment to
/// `on_fragment` in arrival order. Reading stops early when the callback
/// returns `false`. Returns the number of fragments relayed.
pub fn relay_events<R, F>(reader: R, mut on_fragment: F) -> Result<usize, GeminiError>
where
    R: BufRead,
    F: FnMut(&str) -> bool,
{
    let mut relayed = 0;
    let mut data = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| GeminiError::Transport(e.to_string()))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if !dispatch(&mut data, &mut on_fragment, &mut relayed)? {
                return Ok(relayed);
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // Other SSE fields (event, id, retry, comments) carry nothing we use.
    }
    dispatch(&mut data, &mut on_fragment, &mut relayed)?;
    Ok(relayed)
}

fn dispatch<F>(data: &mut String, on_fragment: &mut F, relayed: &mut usize) -> Result<bool, GeminiError>
where
    F: FnMut(&str) -> bool,
{
    if data.is_empty() {
        return Ok(true);
    }
    let payload = std::mem::take(data);
    if payload.trim() == "[DONE]" {
        return Ok(true);
    }
    let fragment = fragment_from_payload(&payload)?;
    if fragment.is_empty() {
        return Ok(true);
    }
    *relayed += 1;
    Ok(on_fragment(&fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thought_parts_are_not_relayed() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"hmm","thought":true},{"text":"answer"}]}}]}"#;
        assert_eq!(fragment_from_payload(payload).unwrap(), "answer");
    }

    #[test]
    fn multi_line_data_is_joined() {
        let body = "data: {\"candidates\":\ndata: [{\"content\":{\"parts\":[{\"text\":\"x\"}]}}]}\n\n";
        let mut seen = Vec::new();
        relay_events(body.as_bytes(), |f| {
            seen.push(f.to_string());
            true
        })
        .unwrap();
        assert_eq!(seen, vec!["x"]);
    }
}
