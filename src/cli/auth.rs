// src/cli/auth.rs — login / signup / logout / whoami

use crate::api::{ApiClient, Credentials};
use crate::session::SessionScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

/// Handle `taskmaster login` and `taskmaster signup`.
pub async fn run_auth(
    mode: AuthMode,
    scope: &mut SessionScope,
    api: &ApiClient,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let credentials = Credentials {
        email: match email {
            Some(e) => e,
            None => inquire::Text::new("Email:").prompt()?,
        },
        password: match password {
            Some(p) => p,
            None => prompt_password(mode)?,
        },
    };

    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        anyhow::bail!("Email and password are required");
    }

    let user = match mode {
        AuthMode::Login => scope.login(api, &credentials).await,
        AuthMode::Signup => scope.signup(api, &credentials).await,
    }
    .map_err(|e| anyhow::anyhow!("{}", e.detail()))?;

    match mode {
        AuthMode::Login => println!("Logged in as {}", user.email),
        AuthMode::Signup => println!("Account created. Logged in as {}", user.email),
    }
    println!("Run `taskmaster dashboard` to get started.");
    Ok(())
}

fn prompt_password(mode: AuthMode) -> anyhow::Result<String> {
    let prompt = inquire::Password::new("Password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked);
    let prompt = match mode {
        AuthMode::Login => prompt.without_confirmation(),
        AuthMode::Signup => prompt.with_custom_confirmation_message("Confirm password:"),
    };
    Ok(prompt.prompt()?)
}

pub fn run_logout(scope: &mut SessionScope) -> anyhow::Result<()> {
    let was_logged_in = scope.is_authenticated();
    scope.logout()?;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn run_whoami(scope: &SessionScope) -> anyhow::Result<()> {
    match scope.session() {
        Some(session) => {
            println!("{} ({})", session.user.email, session.user.id);
            println!(
                "  Session expires {}",
                session.expires_at().format("%Y-%m-%d")
            );
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
