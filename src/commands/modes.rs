//! Mode catalog listing and service health
//!
//! Both commands talk to the answer service directly without touching the
//! persisted session.

use crate::api::{AnswerService, ModeCatalog};
use crate::error::{DocbotError, Result};
use crate::mode::default_catalog;
use colored::Colorize;
use prettytable::{format, row, Table};

/// List the modes and modules offered by the service
///
/// Falls back to the built-in catalog when the service cannot be reached.
pub async fn list_modes(service: &dyn AnswerService) -> Result<()> {
    let catalog = match service.modes().await {
        Ok(catalog) if !catalog.modes.is_empty() => catalog,
        Ok(_) => {
            tracing::warn!("Service offered no modes, showing built-in catalog");
            default_catalog()
        }
        Err(e) => {
            tracing::warn!("Failed to load modes from service: {}", e);
            println!(
                "{}",
                "Service unavailable, showing built-in modes.".yellow()
            );
            default_catalog()
        }
    };
    print_catalog(&catalog, None);
    Ok(())
}

/// Print a mode catalog as a table, marking the active mode
pub fn print_catalog(catalog: &ModeCatalog, active: Option<&str>) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "".bold(),
        "ID".bold(),
        "Name".bold(),
        "Module".bold(),
        "Description".bold()
    ]);

    for mode in &catalog.modes {
        let marker = if active == Some(mode.id.as_str()) { "*" } else { "" };
        let module = if mode.requires_module { "required" } else { "-" };
        table.add_row(row![
            marker,
            mode.id.cyan(),
            mode.label,
            module,
            mode.description.as_deref().unwrap_or("")
        ]);
    }

    println!("\nQuery Modes:");
    table.printstd();
    if !catalog.modules.is_empty() {
        println!("\nModules: {}", catalog.modules.join(", "));
    }
    println!();
}

/// Check and print answer service health
///
/// # Errors
///
/// Returns an error if the service is unreachable or reports unhealthy
pub async fn check_health(service: &dyn AnswerService) -> Result<()> {
    let health = service.health().await?;
    let name = health.service.as_deref().unwrap_or("answer service");

    if !health.is_healthy() {
        println!("{} {}: {}", "✗".red(), name, health.status.red());
        return Err(DocbotError::Service {
            status: 503,
            message: format!("{} reported status {}", name, health.status),
        }
        .into());
    }

    println!("{} {}: {}", "✓".green(), name, health.status.green());
    if let Some(client) = &health.client {
        println!("  Client:      {}", client);
    }
    if let Some(environment) = &health.environment {
        println!("  Environment: {}", environment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedService;

    #[tokio::test]
    async fn test_list_modes_falls_back_to_builtin() {
        let service = ScriptedService::new(Vec::new());
        assert!(list_modes(&service).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_unsupported_is_error() {
        let service = ScriptedService::new(Vec::new());
        let err = check_health(&service).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn test_print_catalog_with_active_mode() {
        print_catalog(&default_catalog(), Some("general"));
    }
}
