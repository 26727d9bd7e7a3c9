use crate::api::AnswerService;
use crate::commands::print_message;
use crate::error::{DocbotError, Result};
use crate::session::SessionIdentity;
use crate::storage::KeyValueStore;
use crate::theme::ThemePreference;
use crate::timeline::Message;
use colored::Colorize;
use std::sync::Arc;

/// Print the stored history of a session
///
/// Uses `session` when given, otherwise the persisted session token.
///
/// # Errors
///
/// Returns an error if no session is known or the fetch fails
pub async fn show_history(
    service: &dyn AnswerService,
    store: Arc<dyn KeyValueStore>,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let token = match session {
        Some(token) => token,
        None => match SessionIdentity::new(store.clone()).current()? {
            Some(session) => session.token(),
            None => {
                return Err(DocbotError::Config(
                    "No persisted session. Start one with `docbot chat` or pass --session"
                        .to_string(),
                )
                .into())
            }
        },
    };

    tracing::info!("Fetching history for session {}", token);
    let messages: Vec<Message> = service
        .history(&token)
        .await?
        .into_iter()
        .map(Message::from_history)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("{}", "No messages in this session.".yellow());
        return Ok(());
    }

    let theme = ThemePreference::load(store.as_ref())?;
    println!("\nHistory for session {}:\n", token.cyan());
    for message in &messages {
        print_message(message, theme);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionIdentity;
    use crate::storage::MemoryStore;
    use crate::test_utils::ScriptedService;

    #[tokio::test]
    async fn test_show_history_without_session_fails() {
        let service = ScriptedService::new(Vec::new());
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let result = show_history(&service, store, None, false).await;
        assert!(result.unwrap_err().to_string().contains("No persisted session"));
    }

    #[tokio::test]
    async fn test_show_history_uses_persisted_session() {
        let service =
            ScriptedService::new(Vec::new()).with_history(vec![("user", "q1"), ("assistant", "a1")]);
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        SessionIdentity::new(store.clone()).initialize().unwrap();
        assert!(show_history(&service, store, None, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_show_history_unknown_session_fails() {
        let service = ScriptedService::new(Vec::new());
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        assert!(show_history(&service, store, Some("missing".into()), false)
            .await
            .is_err());
    }
}
