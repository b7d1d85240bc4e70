use recordvault_core::auth::TokenIssuer;
use recordvault_core::records::LoginRequest;
use recordvault_core::service::LoginResponse;

use crate::app::secrets::admin_password;
use crate::app::AppContext;
use crate::cli::CredentialArgs;
use crate::output::print_json;

fn read_request(ctx: &AppContext, args: &CredentialArgs) -> anyhow::Result<LoginRequest> {
    let password = admin_password(ctx.interactive(), false)?;
    let request = LoginRequest::new(args.email.clone(), password.as_str());
    request.validate()?;
    Ok(request)
}

/// Prints the token alone on stdout so it can be captured by a shell.
pub fn handle_login(ctx: &AppContext, args: &CredentialArgs) -> anyhow::Result<()> {
    let sessions = ctx.sessions()?;
    let request = read_request(ctx, args)?;
    let identity = ctx.verifier()?.verify(&request.email, &request.password)?;
    let session = sessions.issue(&identity)?;
    let response = LoginResponse { identity, session };

    if ctx.json() {
        return print_json(&response.to_json()?);
    }
    if !ctx.quiet() {
        eprintln!(
            "Logged in as {} (expires {})",
            response.identity.email,
            response.session.expires_at().to_rfc3339()
        );
    }
    println!("{}", response.session.as_str());
    Ok(())
}

pub fn handle_verify(ctx: &AppContext, args: &CredentialArgs) -> anyhow::Result<()> {
    let request = read_request(ctx, args)?;
    ctx.verifier()?.reverify(&request.email, &request.password)?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "verified": true }));
    }
    if !ctx.quiet() {
        println!("Credentials verified");
    }
    Ok(())
}
