//! Quote CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::fixtures::DEFAULT_FIXTURES_PATH;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Price a fixture cart and print the quote
#[derive(Debug, Parser)]
#[command(name = "campus-cart-quote", about = "Price a campus cart fixture", long_about = None)]
pub struct QuoteArgs {
    /// Fixture set to load
    #[arg(short, long, default_value = "campus")]
    pub fixture: String,

    /// Directory holding fixture sets
    #[arg(long, env = "CAMPUS_CART_FIXTURES", default_value = DEFAULT_FIXTURES_PATH)]
    pub fixtures_path: PathBuf,

    /// Campus id or name, overriding the one in the cart fixture
    #[arg(long)]
    pub campus: Option<String>,

    /// Coupon code to apply
    #[arg(short, long)]
    pub coupon: Option<String>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
