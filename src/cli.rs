use clap::Parser;
use std::path::PathBuf;

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "HTTP:   ureq 2 (blocking, worker pool)\n",
    "Mock:   rouille 3\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// NASA EPIC Earth imagery viewer
#[derive(Parser, Debug, Default)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// EPIC API base URL (overrides settings)
    #[arg(short = 'u', long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Date to open on startup (YYYY-MM-DD)
    #[arg(short = 'd', long = "date", value_name = "DATE")]
    pub date: Option<String>,

    /// Auto-play as soon as the first image is loaded
    #[arg(short = 'a', long = "autoplay")]
    pub autoplay: bool,

    /// Start the embedded mock backend with synthetic imagery and use it
    #[arg(long = "demo")]
    pub demo: bool,

    /// Enable debug logging to file (default: epic_viewer.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Worker threads for network and decoding (default: 3/4 of CPU cores)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "epic-viewer",
            "--api-url",
            "http://localhost:3000",
            "--date",
            "2015-06-13",
            "-a",
            "-vv",
            "--workers",
            "2",
        ]);
        assert_eq!(args.api_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(args.date.as_deref(), Some("2015-06-13"));
        assert!(args.autoplay);
        assert!(!args.demo);
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.workers, Some(2));
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_log_flag_without_value() {
        let args = Args::parse_from(["epic-viewer", "--demo", "--log"]);
        assert!(args.demo);
        assert_eq!(args.log_file, Some(None));
    }
}
