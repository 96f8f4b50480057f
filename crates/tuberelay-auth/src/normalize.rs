// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort cleanup of a pasted out-of-band authorization code.
//!
//! Codes arrive over chat, copied by hand from the provider's consent page,
//! and pick up quotes, URL encoding, surrounding words, and invisible
//! characters on the way. [`normalize_oob_code`] reduces that common
//! corruption; it does NOT guarantee a syntactically valid code -- the token
//! endpoint is the arbiter. The function is idempotent: normalizing an
//! already-normalized code returns it unchanged.

use std::sync::OnceLock;

use regex::Regex;

/// Provider codes look like `4/<base64url-ish>`.
fn code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"4/[A-Za-z0-9_-]+").expect("static pattern"))
}

/// Normalize raw pasted text into a candidate authorization code.
///
/// Steps, in order:
/// 1. Strip surrounding whitespace and quote pairs.
/// 2. Decode the URL-encoded marker `4%2F` to `4/`.
/// 3. Extract the longest contiguous `4/[A-Za-z0-9_-]+` token if present.
/// 4. Otherwise, with multiple whitespace-separated tokens, drop the first
///    (usually a label like `code:`) and join the rest.
/// 5. If the result still lacks the `4/` prefix but contains a `4`, attempt
///    a reconstruction: split on `4` and re-prepend it to the first fragment
///    containing a `/`.
///
/// Invisible and whitespace characters never survive into the candidate.
pub fn normalize_oob_code(raw: &str) -> String {
    let text = strip_quotes(raw.trim());
    let text = text.replace("4%2F", "4/");

    if let Some(best) = code_pattern()
        .find_iter(&text)
        .max_by_key(|m| m.as_str().len())
    {
        return best.as_str().to_string();
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let candidate = if tokens.len() > 1 {
        strip_invisible(&tokens[1..].concat())
    } else {
        strip_invisible(&text)
    };

    if !candidate.starts_with("4/") && candidate.contains('4') {
        // Last-resort reconstruction for codes whose prefix was mangled in
        // transit. Over-fits observed paste failures; see the module docs.
        for part in candidate.split('4').skip(1) {
            if part.contains('/') {
                return format!("4{part}");
            }
        }
    }

    candidate
}

/// Strip one or more matching surrounding quote pairs.
fn strip_quotes(mut text: &str) -> &str {
    loop {
        let stripped = text.trim();
        let bytes = stripped.as_bytes();
        if bytes.len() >= 2
            && (bytes[0] == b'"' || bytes[0] == b'\'')
            && bytes[bytes.len() - 1] == bytes[0]
        {
            text = &stripped[1..stripped.len() - 1];
        } else {
            return stripped;
        }
    }
}

/// Drop whitespace and control characters.
fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}
