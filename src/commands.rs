//! Custom command matching
//!
//! User-defined phrase→action bindings are checked before any inference
//! call. Matching is a case-insensitive substring test over the trimmed
//! query, first match wins in collection order.

use crate::i18n::Language;
use crate::response::{AiResponse, ResultKind, SearchResult};
use crate::settings::CustomCommand;

/// Find the first enabled command whose phrase occurs in the query
///
/// Disabled commands never match. Commands whose phrase trims empty are
/// skipped; the settings store rejects them at creation, but a hand-edited
/// store must not make every query a match.
#[must_use]
pub fn find_match<'a>(query: &str, commands: &'a [CustomCommand]) -> Option<&'a CustomCommand> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    commands.iter().find(|cmd| {
        let phrase = cmd.phrase.trim().to_lowercase();
        cmd.enabled && !phrase.is_empty() && normalized.contains(&phrase)
    })
}

/// Synthesize the response for a matched command
///
/// No network is involved; the interpretation and result strings are
/// templated in the session language.
#[must_use]
pub fn command_response(command: &CustomCommand, language: Language) -> AiResponse {
    let (interpretation, description) = match language {
        Language::EsEs => (
            format!("Ejecutando tu comando personalizado: {}", command.action),
            format!("Comando activado: \"{}\"", command.phrase),
        ),
        Language::EnUs => (
            format!("Executing your custom command: {}", command.action),
            format!("Command triggered: \"{}\"", command.phrase),
        ),
    };

    AiResponse {
        interpretation,
        intent: "custom_command".to_string(),
        results: vec![SearchResult {
            id: command.id.clone(),
            title: command.action.clone(),
            description,
            url: command.url.clone().unwrap_or_else(|| "#".to_string()),
            kind: ResultKind::Action,
        }],
        suggestions: Vec::new(),
        custom_command_triggered: Some(true),
        command_url: command.url.clone(),
    }
}
