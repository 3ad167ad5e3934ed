//! Authenticate command

use super::CommandContext;
use crate::OutputFormat;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use dirauth_auth::Authenticator;
use dirauth_core::{AuthenticationResult, Credential};

#[derive(Debug, Args)]
pub struct AuthenticateArgs {
    /// Username to bind as
    #[arg(short, long, requires = "password")]
    pub username: Option<String>,

    /// Password for the username
    #[arg(short, long, env = "DIRAUTH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Token id to look up instead of a username/password pair; any password
    /// (including DIRAUTH_PASSWORD) is ignored
    #[arg(short, long, conflicts_with = "username")]
    pub token: Option<String>,

    /// Print a single flat object: group keys, authenticated, keyfob_id and attributes
    #[arg(long)]
    pub flat: bool,
}

impl AuthenticateArgs {
    pub fn credential(&self) -> Result<Credential> {
        match (&self.token, &self.username, &self.password) {
            (Some(token), _, _) => Ok(Credential::token(token.clone())),
            (None, Some(username), Some(password)) => {
                Ok(Credential::password(username.clone(), password.clone()))
            }
            (None, Some(_), None) => bail!("--password is required with --username"),
            (None, None, _) => bail!("Either --username/--password or --token is required"),
        }
    }
}

/// Returns whether the credential authenticated
pub async fn execute(ctx: &CommandContext, args: &AuthenticateArgs) -> Result<bool> {
    let credential = args.credential()?;

    let authenticator =
        Authenticator::from_config(&ctx.config).context("Invalid directory configuration")?;

    // Only a failed session release comes back as an error
    let result = authenticator.authenticate(&credential).await?;

    println!("{}", render(&result, ctx.output_format, args.flat)?);

    let errors = authenticator.errors();
    if !errors.is_empty() {
        ctx.note(&format!("{}", "Diagnostics:".yellow().bold()));
        for message in &errors {
            ctx.note(&format!("  - {}", message));
        }
    }

    Ok(result.authenticated)
}

pub fn render(result: &AuthenticationResult, format: OutputFormat, flat: bool) -> Result<String> {
    if flat {
        return Ok(serde_json::to_string_pretty(&result.to_flat_map())?);
    }

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &AuthenticationResult) -> String {
    let mut lines = Vec::new();

    let status = if result.authenticated {
        "authenticated".green().bold()
    } else {
        "not authenticated".red().bold()
    };
    lines.push(format!("{:<20} {}", "Status:".bold(), status));

    if let Some(token_id) = &result.token_id {
        lines.push(format!("{:<20} {}", "Token:".bold(), token_id));
    }

    lines.push(String::new());
    lines.push(format!("{}", "Groups".bold()));
    for (key, member) in &result.groups {
        let flag = if *member { "yes".green() } else { "no".dimmed() };
        lines.push(format!("  {:<18} {}", key, flag));
    }

    if !result.attributes.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}", "Attributes".bold()));
        for (name, value) in &result.attributes {
            lines.push(format!("  {:<18} {}", name, value));
        }
    }

    lines.join("\n")
}
