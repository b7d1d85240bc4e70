use recordvault_core::auth::{activate_admin, add_admin, deactivate_admin};
use recordvault_core::validation::normalize_email;

use crate::app::secrets::admin_password;
use crate::app::AppContext;
use crate::cli::AdminCommand;
use crate::output::print_json;

pub fn handle_admin(ctx: &AppContext, command: &AdminCommand) -> anyhow::Result<()> {
    let store = ctx.store()?;
    match command {
        AdminCommand::Add { email } => {
            let password = admin_password(ctx.interactive(), true)?;
            let id = add_admin(store.as_ref(), email, &password)?;
            report(ctx, "added", Some(id), email)
        }
        AdminCommand::Deactivate { email } => {
            deactivate_admin(store.as_ref(), email)?;
            report(ctx, "deactivated", None, email)
        }
        AdminCommand::Activate { email } => {
            activate_admin(store.as_ref(), email)?;
            report(ctx, "activated", None, email)
        }
    }
}

fn report(ctx: &AppContext, action: &str, id: Option<i64>, email: &str) -> anyhow::Result<()> {
    let email = normalize_email(email);
    if ctx.json() {
        return print_json(&serde_json::json!({
            "action": action,
            "id": id,
            "email": email,
        }));
    }
    if !ctx.quiet() {
        match id {
            Some(id) => println!("Admin {} {} (id {})", email, action, id),
            None => println!("Admin {} {}", email, action),
        }
    }
    Ok(())
}
