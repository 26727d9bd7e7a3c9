use crate::api::AnswerService;
use crate::cli::SessionCommand;
use crate::error::{DocbotError, Result};
use crate::session::SessionIdentity;
use crate::storage::KeyValueStore;
use colored::Colorize;
use std::sync::Arc;

/// Handle session commands
///
/// `reset` only replaces the local token; the old session's history stays
/// on the server. `delete` removes server-side history explicitly, and also
/// drops the local token when it is the one deleted.
pub async fn handle_session(
    command: SessionCommand,
    service: &dyn AnswerService,
    store: Arc<dyn KeyValueStore>,
) -> Result<()> {
    let identity = SessionIdentity::new(store);

    match command {
        SessionCommand::Show => match identity.current()? {
            Some(session) => {
                println!("Session: {}", session.token().cyan());
                println!(
                    "Created: {}",
                    session.created_locally.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            None => println!("{}", "No persisted session.".yellow()),
        },
        SessionCommand::Reset => {
            let session = identity.reset()?;
            println!("{} {}", "Started a new session:".green(), session.token().cyan());
        }
        SessionCommand::Delete { id } => {
            let current = identity.current()?;
            let token = match (id, &current) {
                (Some(id), _) => id,
                (None, Some(session)) => session.token(),
                (None, None) => {
                    return Err(DocbotError::Config(
                        "No persisted session. Pass --id to delete a specific session".to_string(),
                    )
                    .into())
                }
            };

            service.delete_session(&token).await?;
            println!("{}", format!("Deleted session {}", token).green());

            if current.is_some_and(|session| session.token() == token) {
                let session = identity.reset()?;
                println!("{} {}", "Started a new session:".green(), session.token().cyan());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::ScriptedService;

    #[tokio::test]
    async fn test_reset_replaces_token() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let identity = SessionIdentity::new(store.clone());
        let before = identity.initialize().unwrap();

        let service = ScriptedService::new(Vec::new());
        handle_session(SessionCommand::Reset, &service, store.clone())
            .await
            .unwrap();
        let after = identity.current().unwrap().unwrap();
        assert_ne!(&after, before.session());
    }

    #[tokio::test]
    async fn test_show_without_session_is_ok() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let service = ScriptedService::new(Vec::new());
        assert!(handle_session(SessionCommand::Show, &service, store)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_without_any_session_fails() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let service = ScriptedService::new(Vec::new());
        let err = handle_session(SessionCommand::Delete { id: None }, &service, store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No persisted session"));
    }

    #[tokio::test]
    async fn test_delete_unsupported_keeps_token() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let identity = SessionIdentity::new(store.clone());
        let start = identity.initialize().unwrap();

        let service = ScriptedService::new(Vec::new());
        assert!(handle_session(SessionCommand::Delete { id: None }, &service, store)
            .await
            .is_err());
        assert_eq!(identity.current().unwrap().as_ref(), Some(start.session()));
    }
}
