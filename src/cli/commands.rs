//! CLI command definitions

use clap::{ArgGroup, Parser, Subcommand};
use rtctoken::Role;

#[derive(Parser)]
#[command(name = "rtctoken")]
#[command(about = "Issue signed access tokens for real-time channels", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// App ID issued by the provider [default: $RTC_APP_ID]
    #[arg(long, global = true)]
    pub app_id: Option<String>,

    /// App certificate, hex [default: $RTC_APP_CERTIFICATE]
    #[arg(long, global = true)]
    pub app_certificate: Option<String>,

    /// Print a JSON object instead of the bare token
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a channel join token
    ///
    /// Examples:
    ///   rtctoken channel room1 --uid 42
    ///   rtctoken channel room1 --account alice --role subscriber --expire 600
    #[command(group(ArgGroup::new("identity").args(["uid", "account"])))]
    Channel {
        /// Channel name
        channel: String,

        /// Numeric user id (0 allows any uid)
        #[arg(long)]
        uid: Option<u32>,

        /// String user account
        #[arg(long)]
        account: Option<String>,

        /// publisher or subscriber
        #[arg(short, long, default_value = "publisher", value_parser = parse_role)]
        role: Role,

        /// Token lifetime in seconds [default: $RTC_TOKEN_EXPIRE or 3600]
        #[arg(long)]
        expire: Option<u32>,

        /// Privilege lifetime in seconds, 0 for none [default: $RTC_PRIVILEGE_EXPIRE or 3600]
        #[arg(long)]
        privilege_expire: Option<u32>,
    },

    /// Issue a messaging login token
    Messaging {
        /// User id to log in as
        user_id: String,

        /// Token and login lifetime in seconds [default: $RTC_TOKEN_EXPIRE or 3600]
        #[arg(long)]
        expire: Option<u32>,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse::<Role>().map_err(|e| e.to_string())
}
