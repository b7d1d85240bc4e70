use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use recordvault_core::auth::MAX_SESSION_TTL_SECONDS;
use recordvault_core::VERSION;

/// RecordVault - encrypted-at-rest storage for sensitive records
#[derive(Parser)]
#[command(name = "recordvault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "RECORDVAULT_CONFIG")]
    pub config: Option<String>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Database file (defaults to the XDG data directory)
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,

    /// Keys directory (defaults to the XDG data directory)
    #[arg(long, value_name = "DIR")]
    pub keys_dir: Option<String>,

    /// Session lifetime in seconds
    #[arg(
        long,
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)
    )]
    pub session_ttl_seconds: u64,

    /// RSA modulus size for a newly generated key pair
    #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u16).range(2048..=8192))]
    pub key_bits: u16,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum KeysCommand {
    /// Generate the key pair (refuses if any key file exists)
    Init {
        /// RSA modulus size
        #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u16).range(2048..=8192))]
        key_bits: u16,
    },

    /// Show which key files exist and the public key fingerprint
    Status {
        /// Also unwrap the private key to confirm the passphrase
        #[arg(long)]
        check: bool,
    },

    /// Re-encrypt the private key under a new passphrase
    Rewrap,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Provision a new admin account
    Add {
        #[arg(value_name = "EMAIL")]
        email: String,
    },

    /// Disable an admin account
    Deactivate {
        #[arg(value_name = "EMAIL")]
        email: String,
    },

    /// Re-enable an admin account
    Activate {
        #[arg(value_name = "EMAIL")]
        email: String,
    },
}

/// Arguments for `login` and `verify`
#[derive(Args)]
pub struct CredentialArgs {
    /// Admin email
    #[arg(value_name = "EMAIL")]
    pub email: String,
}

/// Session token shared by all record commands
#[derive(Args)]
pub struct TokenArgs {
    /// Session token from `recordvault login`
    #[arg(long, env = "RECORDVAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Record fields for `record add` and `record update`
#[derive(Args)]
pub struct RecordFields {
    /// Record name
    #[arg(long)]
    pub name: String,

    /// Contact email stored with the record
    #[arg(long)]
    pub email: String,

    /// Sensitive payload as JSON
    #[arg(long, conflicts_with = "text")]
    pub data: Option<String>,

    /// Sensitive payload as plain text (otherwise read from stdin)
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// Encrypt and store a new record
    Add {
        #[command(flatten)]
        token: TokenArgs,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// List records with their decrypted payloads
    List {
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Show one record
    Show {
        #[command(flatten)]
        token: TokenArgs,

        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Replace a record's fields and payload
    Update {
        #[command(flatten)]
        token: TokenArgs,

        #[arg(value_name = "ID")]
        id: i64,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// Delete a record
    Delete {
        #[command(flatten)]
        token: TokenArgs,

        #[arg(value_name = "ID")]
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write config, create the database, and generate keys
    Init(InitArgs),

    /// Manage the RSA key pair
    #[command(subcommand)]
    Keys(KeysCommand),

    /// Provision and manage admin accounts
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Verify admin credentials and print a session token
    Login(CredentialArgs),

    /// Re-check admin credentials without logging in
    Verify(CredentialArgs),

    /// Work with protected records
    #[command(subcommand)]
    Record(RecordCommand),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
