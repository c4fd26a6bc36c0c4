use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "emotrack", version, about = "Emotion-monitoring API client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Base URL of the emotion-monitoring API.
    #[arg(long, global = true, env = "EMOTRACK_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Directory holding the persisted session.
    #[arg(long, global = true, env = "EMOTRACK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Delay between job status polls, in milliseconds.
    #[arg(long, global = true, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EMOTRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not sign in unless --login is given.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EMOTRACK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Sign in with the same credentials after a successful signup.
        #[arg(long)]
        login: bool,
    },
    /// Sign in with a Google access token.
    Google {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Ask for a password reset code.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using a reset code.
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },
    /// Upload a zipped chat export and follow the analysis to the end.
    Analyze {
        /// Path to the .zip archive.
        file: PathBuf,
    },
    /// Classify one piece of text.
    Predict {
        text: String,
    },
    /// Fetch a dashboard dataset and print it as JSON.
    Fetch {
        #[arg(value_enum)]
        dataset: Dataset,
        /// Time range such as 7d or 30d, where the dataset takes one.
        #[arg(long, default_value = "7d")]
        range: String,
        /// Days of history for fusion and support insights.
        #[arg(long, default_value_t = 14)]
        days: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Timeline,
    Distribution,
    Drift,
    Alerts,
    Compare,
    SelfHistory,
    SelfDistribution,
    Fusion,
    SupportInsights,
}
