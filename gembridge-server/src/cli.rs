use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gembridge",
    about = "gembridge - OpenAI-compatible gateway for the Gemini API",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(short, long, env = "GEMBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long, env = "GEMBRIDGE_HOST")]
    pub host: Option<String>,

    /// Override the configured port
    #[arg(short, long, env = "GEMBRIDGE_PORT")]
    pub port: Option<u16>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::parse_from([
            "gembridge",
            "--config",
            "/etc/gembridge.json",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "-l",
            "debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/gembridge.json")));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
