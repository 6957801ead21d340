use axis_core::auth::AuthProvider;
use axis_core::LocalAuthProvider;
use clap::Subcommand;
use serde_json::json;

use super::{open_kv, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    SignUp {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in to an existing account
    SignIn {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    SignOut,
    /// Check sign-in status
    Status,
}

pub fn run(action: AuthAction) -> CmdResult {
    let auth = LocalAuthProvider::new(open_kv()?);

    match action {
        AuthAction::SignUp { email, password } => {
            let session = auth.sign_up(&email, &password)?;
            print_json(&json!({ "signedIn": true, "email": session.email }))?;
        }
        AuthAction::SignIn { email, password } => {
            let session = auth.sign_in(&email, &password)?;
            print_json(&json!({ "signedIn": true, "email": session.email }))?;
        }
        AuthAction::SignOut => {
            auth.sign_out()?;
            print_json(&json!({ "signedIn": false }))?;
        }
        AuthAction::Status => {
            let session = auth.current_session();
            print_json(&json!({
                "signedIn": session.is_some(),
                "email": session.as_ref().map(|s| s.email.as_str()),
                "since": session.as_ref().map(|s| s.signed_in_at),
            }))?;
        }
    }
    Ok(())
}
