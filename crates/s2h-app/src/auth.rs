//! Sign-in gate, used only when a record store is configured.

use std::io::Write;

use s2h_chat::{AuthError, Identity, SupabaseAuth};
use tracing::warn;

use crate::repl::InputLines;

pub const PASSWORD_ENV: &str = "S2H_PASSWORD";

async fn prompt(lines: &mut InputLines, label: &str) -> Option<String> {
    print!("{label}: ");
    let _ = std::io::stdout().flush();
    match lines.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "stdin read failed");
            None
        }
    }
}

/// Ask for credentials until sign-in succeeds. Returns `None` on EOF.
///
/// A preset email/password (flag, `S2H_PASSWORD`) is tried once before
/// falling back to prompts.
pub async fn sign_in(
    auth: &SupabaseAuth,
    lines: &mut InputLines,
    mut email: Option<String>,
    mut password: Option<String>,
    sign_up: bool,
) -> Option<Identity> {
    let action = if sign_up { "Sign up" } else { "Sign in" };
    println!("{action} to save your assessments.");

    loop {
        let email_value = match email.take() {
            Some(e) => e,
            None => prompt(lines, "Email").await?,
        };
        let password_value = match password.take() {
            Some(p) => p,
            None => prompt(lines, "Password").await?,
        };
        if email_value.is_empty() || password_value.is_empty() {
            println!("  Email and password are required.");
            continue;
        }

        let result = if sign_up {
            auth.sign_up(&email_value, &password_value).await
        } else {
            auth.sign_in(&email_value, &password_value).await
        };

        match result {
            Ok(identity) => {
                println!(
                    "Signed in as {}.",
                    identity.email.as_deref().unwrap_or(&identity.user_id)
                );
                return Some(identity);
            }
            Err(e @ AuthError::ConfirmationRequired(_)) => {
                println!("  {e}");
                return None;
            }
            Err(e) => println!("  {action} failed: {e}"),
        }
    }
}
