//! Output cleanup for GPT-2 style candidates.

/// Marker the model emits between documents
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// Turn a raw candidate into the text returned to the caller.
///
/// Removes the first occurrence of `prompt` (wherever it appears, not only as
/// a prefix), cuts at the first end-of-text marker, then trims whitespace.
/// If the model did not echo the prompt verbatim nothing is removed.
pub fn clean_output(candidate: &str, prompt: &str) -> String {
    let stripped = if prompt.is_empty() {
        candidate.to_string()
    } else {
        candidate.replacen(prompt, "", 1)
    };

    let truncated = match stripped.find(END_OF_TEXT) {
        Some(end) => &stripped[..end],
        None => stripped.as_str(),
    };

    truncated.trim().to_string()
}
