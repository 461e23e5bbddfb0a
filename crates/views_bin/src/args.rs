use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use viewcatalog::UserIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns with a header.
    Text,
    /// One json object per row.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl From<LogFormat> for logutil::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Text => logutil::LogFormat::HumanReadable,
            LogFormat::Json => logutil::LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "list_views",
    about = "List views from a catalog as information_schema.views rows"
)]
pub struct Arguments {
    /// Path to a json catalog definition.
    #[arg(short, long, env = "LIST_VIEWS_CATALOG")]
    pub catalog: PathBuf,

    /// LIKE pattern on database names.
    #[arg(long)]
    pub db: Option<String>,

    /// LIKE pattern on view names.
    #[arg(long)]
    pub wild: Option<String>,

    /// Already resolved identity in the form `user@host`. Takes precedence
    /// over `--user` and `--user-ip`.
    #[arg(long, value_parser = parse_identity)]
    pub current_user: Option<UserIdentity>,

    #[arg(short, long, env = "LIST_VIEWS_USER")]
    pub user: Option<String>,

    #[arg(long)]
    pub user_ip: Option<String>,

    /// Max rows per pull from the scanner.
    #[arg(long, default_value_t = 1024)]
    pub batch_size: usize,

    /// Only output these columns, in order.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, default_value_t = tracing::Level::WARN, env = "LIST_VIEWS_LOG_LEVEL")]
    pub log_level: tracing::Level,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

fn parse_identity(s: &str) -> Result<UserIdentity, String> {
    match s.rsplit_once('@') {
        Some((user, host)) if !user.is_empty() && !host.is_empty() => {
            Ok(UserIdentity::new(user, host))
        }
        _ => Err(format!("expected user@host, got '{s}'")),
    }
}
