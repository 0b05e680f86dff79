//! Login, logout, and whoami commands

use colored::Colorize;

use crate::commands::password::read_password;
use crate::commands::AppContext;
use crate::error::{KampusError, Result};
use crate::resolver::IdentitySource;

/// Signs in and caches the session.
///
/// Prompts for the password when none was given on the command line or in
/// `KAMPUS_PASSWORD`.
pub async fn login(ctx: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let identity = ctx.manager.login(email, &password).await?;
    println!(
        "{} {}",
        "Signed in as".green(),
        identity.email.as_deref().unwrap_or(&identity.uid).cyan()
    );
    if !ctx.sessions.is_durable() {
        println!(
            "{}",
            "Session storage is not durable; the session will not survive this process.".yellow()
        );
    }
    Ok(())
}

/// Signs out and clears the cached session.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.manager.logout().await;
    println!("{}", "Signed out.".green());
    Ok(())
}

/// Prints the current user and where that identity came from.
pub async fn whoami(ctx: &AppContext) -> Result<()> {
    println!("{}", describe_current_user(ctx).await);
    Ok(())
}

/// One-line description of the current user.
pub async fn describe_current_user(ctx: &AppContext) -> String {
    let resolved = match ctx.resolver.resolve_identity().await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return "Not logged in.".yellow().to_string(),
        Err(e) => return format!("{} {}", "Could not determine the current user:".red(), e),
    };

    let email = match resolved.source {
        IdentitySource::Cache => ctx.sessions.load().and_then(|r| r.email),
        IdentitySource::LiveProvider => ctx
            .provider
            .current_identity()
            .await
            .and_then(|identity| identity.email),
    };

    match email {
        Some(email) => format!(
            "{} ({}) via {}",
            resolved.uid.cyan(),
            email,
            resolved.source
        ),
        None => format!("{} via {}", resolved.uid.cyan(), resolved.source),
    }
}

fn prompt_password() -> Result<String> {
    let password = read_password("Password: ")
        .map_err(|e| KampusError::Authentication(format!("Cannot read password: {}", e)))?;
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FakeIdentityProvider, Identity};
    use crate::config::Config;
    use crate::documents::InMemoryDocumentStore;
    use crate::kv::MemoryStore;
    use crate::session::SessionRecord;
    use std::sync::Arc;

    fn context(provider: Arc<FakeIdentityProvider>) -> AppContext {
        AppContext::with_parts(
            &Config::default(),
            Arc::new(MemoryStore::new()),
            provider,
            Arc::new(InMemoryDocumentStore::new()),
        )
    }

    #[tokio::test]
    async fn test_describe_current_user_when_logged_out() {
        colored::control::set_override(false);
        let ctx = context(Arc::new(FakeIdentityProvider::new()));
        assert_eq!(describe_current_user(&ctx).await, "Not logged in.");
    }

    #[tokio::test]
    async fn test_describe_current_user_from_cache() {
        colored::control::set_override(false);
        let ctx = context(Arc::new(FakeIdentityProvider::new()));
        ctx.sessions
            .save(&SessionRecord::new("u1", Some("a@x.com".to_string()), None).unwrap());

        assert_eq!(describe_current_user(&ctx).await, "u1 (a@x.com) via cache");
    }

    #[tokio::test]
    async fn test_describe_current_user_from_live_provider() {
        colored::control::set_override(false);
        let provider = Arc::new(FakeIdentityProvider::new());
        provider.set_current(Some(Identity::new("live")));
        let ctx = context(provider);

        assert_eq!(describe_current_user(&ctx).await, "live via live-provider");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_returns_error() {
        let provider = Arc::new(FakeIdentityProvider::new().with_account(
            "a@x.com",
            "secret",
            Identity::new("u1"),
        ));
        let ctx = context(provider);

        assert!(login(&ctx, "a@x.com", Some("nope".to_string())).await.is_err());
        assert!(ctx.sessions.load().is_none());
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let provider = Arc::new(FakeIdentityProvider::new().with_account(
            "a@x.com",
            "secret",
            Identity::new("u1"),
        ));
        let ctx = context(provider);

        login(&ctx, "a@x.com", Some("secret".to_string())).await.unwrap();
        assert!(ctx.sessions.load().is_some());

        logout(&ctx).await.unwrap();
        assert!(ctx.sessions.load().is_none());
    }
}
