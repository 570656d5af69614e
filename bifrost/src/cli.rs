//! Command-line flags; each one overrides its environment counterpart.

use clap::Parser;

/// Read-only GraphQL gateway over the PsychonautWiki API.
#[derive(Parser, Debug, Default)]
#[command(name = "bifrost", version, about)]
pub struct Cli {
    /// Listening port (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,

    /// Log filter directive (overrides LOG_LEVEL).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Log every executed GraphQL query.
    #[arg(long)]
    pub debug_requests: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from(["bifrost", "--port", "8080", "--log-level", "debug"]);
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(!cli.json_logs);
    }

    #[test]
    fn defaults_to_no_overrides() {
        let cli = Cli::parse_from(["bifrost"]);
        assert_eq!(cli.port, None);
        assert!(cli.log_level.is_none());
        assert!(!cli.debug_requests);
    }
}
