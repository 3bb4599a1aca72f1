//! Clap derive structures for the `rxlink` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rxlink -- patients, orders and prescriptions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "rxlink",
    version,
    about = "Work with the rxlink pharmacy API from the command line",
    long_about = "Sign in through your organization's identity provider, then read and\n\
        write patients, orders, prescriptions, webhooks and API clients.\n\n\
        Sessions are kept in the system keyring, one per profile.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "RXLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Identity provider domain (overrides profile)
    #[arg(long, env = "RXLINK_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// OAuth client id (overrides profile)
    #[arg(long, env = "RXLINK_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// GraphQL endpoint (overrides profile)
    #[arg(long, env = "RXLINK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RXLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "RXLINK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "RXLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in through the identity provider
    Login(LoginArgs),

    /// Forget the stored session and print the provider's logout URL
    Logout(LogoutArgs),

    /// Show the signed-in user
    Whoami,

    /// Print an access token for the API
    Token(TokenArgs),

    /// Manage patients
    #[command(alias = "pt")]
    Patients(PatientsArgs),

    /// Manage orders
    Orders(OrdersArgs),

    /// Manage prescriptions
    #[command(alias = "rx")]
    Prescriptions(PrescriptionsArgs),

    /// Manage webhook subscriptions
    Webhooks(WebhooksArgs),

    /// Manage API clients
    Clients(ClientsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Organization to sign in as (defaults to the profile's)
    #[arg(long)]
    pub organization: Option<String>,

    /// Invitation ticket from an organization invite link
    #[arg(long)]
    pub invitation: Option<String>,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Where the identity provider should send the browser afterwards
    #[arg(long)]
    pub return_to: Option<String>,
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Audience to request (defaults to the profile's)
    #[arg(long)]
    pub audience: Option<String>,
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Cursor pagination shared by list commands.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page size (25 when unset or zero)
    #[arg(long, short = 'l')]
    pub first: Option<u32>,

    /// Cursor to continue after
    #[arg(long)]
    pub after: Option<String>,
}

/// Post-write refresh of cached lists.
#[derive(Debug, Args)]
pub struct RefetchArgs {
    /// List to refresh after the write (patients, orders, prescriptions,
    /// webhooks, clients); repeatable
    #[arg(long = "refetch", value_name = "NAME")]
    pub refetch: Vec<String>,

    /// Wait for the refreshes to finish before reporting
    #[arg(long)]
    pub await_refetch: bool,
}

// ── Patients ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: PatientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PatientsCommand {
    /// List patients
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Filter by name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show one patient
    Get {
        /// Patient ID
        id: String,
    },

    /// Create a patient
    Create {
        /// First name
        #[arg(long, required_unless_present = "from_file")]
        first: Option<String>,

        /// Last name
        #[arg(long, required_unless_present = "from_file")]
        last: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long, required_unless_present = "from_file")]
        dob: Option<String>,

        /// Sex (MALE, FEMALE, UNKNOWN)
        #[arg(long, required_unless_present = "from_file")]
        sex: Option<String>,

        /// Phone number
        #[arg(long, required_unless_present = "from_file")]
        phone: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Your own identifier for the patient
        #[arg(long)]
        external_id: Option<String>,

        /// Read the full request from a JSON file instead
        #[arg(long, short = 'F', conflicts_with_all = ["first", "last", "dob", "sex", "phone"])]
        from_file: Option<PathBuf>,

        #[command(flatten)]
        refetch: RefetchArgs,
    },

    /// Update a patient
    Update {
        /// Patient ID
        id: String,

        /// First name (requires --last)
        #[arg(long, requires = "last")]
        first: Option<String>,

        /// Last name (requires --first)
        #[arg(long, requires = "first")]
        last: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Your own identifier for the patient
        #[arg(long)]
        external_id: Option<String>,

        #[command(flatten)]
        refetch: RefetchArgs,
    },
}

// ── Orders ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List orders
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only orders for this patient ID
        #[arg(long)]
        patient_id: Option<String>,

        /// Only orders for patients matching this name
        #[arg(long)]
        patient_name: Option<String>,

        /// Only orders in this state (NEW, PROCESSING, READY, ...)
        #[arg(long)]
        state: Option<String>,
    },

    /// Show one order
    Get {
        /// Order ID
        id: String,
    },

    /// Create an order from a JSON request file
    Create {
        /// JSON file with patientId, fills and address
        #[arg(long, short = 'F')]
        from_file: PathBuf,

        #[command(flatten)]
        refetch: RefetchArgs,
    },
}

// ── Prescriptions ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrescriptionsArgs {
    #[command(subcommand)]
    pub command: PrescriptionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrescriptionsCommand {
    /// List prescriptions
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only prescriptions for this patient ID
        #[arg(long)]
        patient_id: Option<String>,

        /// Only prescriptions written by this prescriber ID
        #[arg(long)]
        prescriber_id: Option<String>,

        /// Only prescriptions in this state (READY, DEPLETED, ...)
        #[arg(long)]
        state: Option<String>,
    },

    /// Show one prescription
    Get {
        /// Prescription ID
        id: String,
    },

    /// Write a prescription from a JSON request file
    Create {
        /// JSON file with patientId, medicationId, dispense and refill details
        #[arg(long, short = 'F')]
        from_file: PathBuf,

        #[command(flatten)]
        refetch: RefetchArgs,
    },
}

// ── Webhooks ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WebhooksArgs {
    #[command(subcommand)]
    pub command: WebhooksCommand,
}

#[derive(Debug, Subcommand)]
pub enum WebhooksCommand {
    /// List webhook subscriptions
    #[command(alias = "ls")]
    List,

    /// Subscribe a URL to events
    Create {
        /// Receiving URL
        url: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Secret used to sign deliveries
        #[arg(long)]
        shared_secret: Option<String>,

        /// Event type to deliver; repeatable (all events when omitted)
        #[arg(long = "filter", value_name = "EVENT")]
        filters: Vec<String>,

        #[command(flatten)]
        refetch: RefetchArgs,
    },

    /// Remove a webhook subscription
    #[command(alias = "rm")]
    Delete {
        /// Webhook ID
        id: String,

        #[command(flatten)]
        refetch: RefetchArgs,
    },
}

// ── Clients ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClientsArgs {
    #[command(subcommand)]
    pub command: ClientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List API clients
    #[command(alias = "ls")]
    List,

    /// Issue a new secret for an API client
    RotateSecret {
        /// Client ID
        id: String,

        #[command(flatten)]
        refetch: RefetchArgs,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
