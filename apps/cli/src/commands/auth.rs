//! Authentication commands.

use super::{current_user, Context};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use serde_json::json;
use session_pipeline::SessionStatus;
use std::io::{self, Write};
use token_store::SessionUser;

/// Login with username and password.
pub async fn login(ctx: &Context, username: Option<String>, format: OutputFormat) -> Result<()> {
    if let SessionStatus::Authenticated(user) = ctx.session.check_auth().await? {
        output::print_success(
            &format!("Already logged in as {}", user.display_name()),
            format,
        );
        return Ok(());
    }

    let username = match username {
        Some(username) => username.trim().to_string(),
        None => prompt("Username: ")?,
    };
    if username.is_empty() {
        bail!("Username is required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password is required");
    }

    let user = ctx.session.login(&username, &password).await?;

    match format {
        OutputFormat::Text => println!("Logged in as {}", user.display_name()),
        OutputFormat::Json => output::print_json(&json!({"status": "success", "user": user})),
    }
    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(ctx: &Context, format: OutputFormat) -> Result<()> {
    ctx.session.logout().await;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Run the startup check and report the outcome.
pub async fn status(ctx: &Context, format: OutputFormat) -> Result<()> {
    let status = ctx.session.check_auth().await?;

    match format {
        OutputFormat::Text => {
            println!("API:      {}", ctx.session.api().api_root());
            println!("Storage:  {}", ctx.paths.storage_file().display());
            match &status {
                SessionStatus::Authenticated(user) => {
                    println!("Auth:     logged in");
                    println!("User:     {}", user.display_name());
                    if let Some(role) = &user.role {
                        println!("Role:     {}", role);
                    }
                }
                SessionStatus::Unauthenticated => println!("Auth:     not logged in"),
                SessionStatus::Unknown => println!("Auth:     unknown"),
            }
        }
        OutputFormat::Json => output::print_json(&status),
    }
    Ok(())
}

/// Show the account behind the stored session, fresh from the server.
pub async fn whoami(ctx: &Context, format: OutputFormat) -> Result<()> {
    let user = current_user(ctx).await?;

    match format {
        OutputFormat::Text => print_user(&user),
        OutputFormat::Json => output::print_json(&user),
    }
    Ok(())
}

/// Change the password of the logged-in account.
pub async fn change_password(ctx: &Context, format: OutputFormat) -> Result<()> {
    current_user(ctx).await?;

    let current = rpassword::prompt_password("Current password: ")?;
    let new = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")?;
    if current.is_empty() || new.is_empty() {
        bail!("Both the current and the new password are required");
    }
    if new != confirm {
        bail!("New passwords do not match");
    }

    let response = ctx.api.auth().change_password(&current, &new).await?;
    output::print_success(
        response.message().unwrap_or("Password changed successfully"),
        format,
    );
    Ok(())
}

fn print_user(user: &SessionUser) {
    output::print_heading(user.display_name());
    output::print_row("ID", &user.id.to_string());
    output::print_row("Username", &user.username);
    output::print_row("Email", user.email.as_deref().unwrap_or("-"));
    output::print_row("Role", user.role.as_deref().unwrap_or("-"));
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
