//! Response normalization
//!
//! Models rarely return bare JSON even when told to. Normalization is a
//! two-stage parse: locate the first balanced brace span in the reply text,
//! then structurally validate it. Any failure yields the deterministic
//! localized fallback instead of an error.

use serde::Deserialize;

use crate::i18n::Language;
use crate::response::{AiResponse, ResultKind, SearchResult};

/// Shape accepted from the model before it becomes an [`AiResponse`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    interpretation: String,
    intent: String,
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Normalize free-form model output into a response
///
/// Never fails: unparseable or malformed output produces the fallback for
/// `query` in `language`.
#[must_use]
pub fn normalize(text: &str, query: &str, language: Language) -> AiResponse {
    match extract_json_object(text).and_then(|span| parse_checked(span)) {
        Some(response) => response,
        None => {
            tracing::debug!(reply_len = text.len(), "model reply not parseable, using fallback");
            fallback_response(query, language)
        }
    }
}

/// Parse a candidate span and apply basic shape checks
fn parse_checked(span: &str) -> Option<AiResponse> {
    let raw: RawResponse = serde_json::from_str(span).ok()?;
    if raw.interpretation.trim().is_empty() || raw.intent.trim().is_empty() {
        return None;
    }

    Some(AiResponse {
        interpretation: raw.interpretation,
        intent: raw.intent,
        results: raw.results,
        suggestions: raw.suggestions,
        custom_command_triggered: None,
        command_url: None,
    })
}

/// Locate the first balanced `{…}` span in `text`
///
/// String-literal aware: braces inside quoted strings don't count, and
/// escaped quotes don't terminate strings.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Deterministic response for when the model's output is unusable
///
/// Everything is a pure function of `query` and `language`, id included, so
/// repeated calls are byte-identical.
#[must_use]
pub fn fallback_response(query: &str, language: Language) -> AiResponse {
    let encoded = urlencoding::encode(query);

    match language {
        Language::EsEs => AiResponse {
            interpretation: format!("Entendí que estás buscando: \"{query}\""),
            intent: "search".to_string(),
            results: vec![SearchResult {
                id: "1".to_string(),
                title: format!("Resultados de búsqueda para \"{query}\""),
                description: "Haz clic para ver más resultados en la web".to_string(),
                url: format!("https://www.google.com/search?q={encoded}&hl=es"),
                kind: ResultKind::Web,
            }],
            suggestions: vec![
                format!("Más sobre {query}"),
                format!("{query} cerca de mí"),
                format!("Mejor {query}"),
            ],
            custom_command_triggered: None,
            command_url: None,
        },
        Language::EnUs => AiResponse {
            interpretation: format!("I understood you're looking for: \"{query}\""),
            intent: "search".to_string(),
            results: vec![SearchResult {
                id: "1".to_string(),
                title: format!("Search results for \"{query}\""),
                description: "Click to see more results on the web".to_string(),
                url: format!("https://www.google.com/search?q={encoded}"),
                kind: ResultKind::Web,
            }],
            suggestions: vec![
                format!("More about {query}"),
                format!("{query} near me"),
                format!("Best {query}"),
            ],
            custom_command_triggered: None,
            command_url: None,
        },
    }
}
