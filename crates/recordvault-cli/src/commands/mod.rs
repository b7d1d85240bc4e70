//! Command handlers, one module per command group.

mod admin;
mod auth;
mod init;
mod keys;
mod misc;
mod records;

use recordvault_core::VERSION;

use crate::app::AppContext;
use crate::cli::Commands;

pub fn dispatch(ctx: &AppContext) -> anyhow::Result<()> {
    match &ctx.cli().command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args),
        Some(Commands::Keys(command)) => keys::handle_keys(ctx, command),
        Some(Commands::Admin(command)) => admin::handle_admin(ctx, command),
        Some(Commands::Login(args)) => auth::handle_login(ctx, args),
        Some(Commands::Verify(args)) => auth::handle_verify(ctx, args),
        Some(Commands::Record(command)) => records::handle_record(ctx, command),
        Some(Commands::Completions(args)) => misc::handle_completions(args.shell),
        None => {
            println!("RecordVault v{}", VERSION);
            println!("\nRun `recordvault --help` for usage information.");
            Ok(())
        }
    }
}
