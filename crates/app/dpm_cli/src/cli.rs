use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dpm_core::models::TopicKind;

#[derive(Parser, Debug)]
#[command(name = "dpm", version, about = "DDS Permissions Manager client")]
pub struct Cli {
    /// Base URL of the DPM backend.
    #[arg(long, global = true, env = "DPM_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Where the access token is kept between invocations.
    #[arg(long, global = true, env = "DPM_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Log in and keep the access token.
    Login {
        /// Email, or an application id.
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "DPM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Drop the session and the stored token.
    Logout,

    /// Show the current session.
    Whoami,

    /// Print the curl invocation for logging in against `DPM_URL`.
    Curl {
        /// Print the application login body for this id and password as well.
        #[arg(long, requires = "password")]
        application: Option<i64>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Print the automation selectors of every table.
    Selectors,

    /// Manage groups.
    #[command(subcommand)]
    Groups(GroupCommand),

    /// Manage group memberships.
    #[command(subcommand)]
    Users(UserCommand),

    /// Manage super users.
    #[command(subcommand)]
    SuperUsers(SuperUserCommand),

    /// Manage topics.
    #[command(subcommand)]
    Topics(TopicCommand),

    /// Manage applications and their secrets.
    #[command(subcommand)]
    Applications(ApplicationCommand),

    /// Manage which applications may access which topics.
    #[command(subcommand)]
    Permissions(PermissionCommand),

    /// Search public groups, topics and applications by name or description.
    Search {
        query: Option<String>,
        #[arg(long)]
        groups: bool,
        #[arg(long)]
        topics: bool,
        #[arg(long)]
        applications: bool,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive substring of the display name.
    #[arg(long, short)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct ScopedListArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Only rows of this group (name or id).
    #[arg(long, short)]
    pub group: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    List(ListArgs),
    Show {
        id: i64,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    Update {
        id: i64,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct MemberFlags {
    #[arg(long)]
    pub group_admin: bool,
    #[arg(long)]
    pub topic_admin: bool,
    #[arg(long)]
    pub application_admin: bool,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    List(ScopedListArgs),
    Show {
        id: i64,
    },
    /// Add a member to a group.
    Create {
        email: String,
        /// Group name or id.
        #[arg(long, short)]
        group: String,
        #[command(flatten)]
        flags: MemberFlags,
    },
    /// Replace a member's admin flags.
    Update {
        id: i64,
        #[command(flatten)]
        flags: MemberFlags,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum SuperUserCommand {
    List(ListArgs),
    Create { email: String },
    Delete { id: i64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TopicKindArg {
    B,
    C,
}

impl From<TopicKindArg> for TopicKind {
    fn from(arg: TopicKindArg) -> Self {
        match arg {
            TopicKindArg::B => TopicKind::B,
            TopicKindArg::C => TopicKind::C,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TopicCommand {
    List(ScopedListArgs),
    Show {
        id: i64,
    },
    Create {
        name: String,
        /// Group name or id.
        #[arg(long, short)]
        group: String,
        #[arg(long, value_enum, default_value = "b")]
        kind: TopicKindArg,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    Delete {
        id: i64,
    },
    /// List the available topic kinds.
    Kinds,
}

#[derive(Subcommand, Debug)]
pub enum ApplicationCommand {
    List(ScopedListArgs),
    Show {
        id: i64,
    },
    Create {
        name: String,
        /// Group name or id.
        #[arg(long, short)]
        group: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    Delete {
        id: i64,
    },
    /// Issue a new bind token; the previous one stops working.
    BindToken {
        id: i64,
    },
    /// Issue a new application password.
    Password {
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct AccessArgs {
    #[arg(long)]
    pub read: bool,
    #[arg(long)]
    pub write: bool,
    /// Limit reads to a DDS partition. Repeatable.
    #[arg(long = "read-partition", value_name = "PARTITION")]
    pub read_partitions: Vec<String>,
    /// Limit writes to a DDS partition. Repeatable.
    #[arg(long = "write-partition", value_name = "PARTITION")]
    pub write_partitions: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum PermissionCommand {
    /// Applications granted access to a topic.
    ByTopic { topic: i64 },
    /// Topics an application has been granted.
    ByApplication { application: i64 },
    /// Grant the application behind a bind token access to a topic.
    Add {
        topic: i64,
        #[arg(long, env = "APPLICATION_BIND_TOKEN", hide_env_values = true)]
        bind_token: String,
        #[command(flatten)]
        access: AccessArgs,
    },
    Update {
        id: i64,
        #[command(flatten)]
        access: AccessArgs,
    },
    Remove {
        id: i64,
    },
}
