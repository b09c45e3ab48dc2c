use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nvd_client::{
    client::Endpoint,
    config::Config,
    logging,
    output::{format_result_to_string, print_result, OutputFormat},
    DateFilters, DateInput, NvdApi, NvdError, Pagination,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const INVALID_INPUT: u8 = 2;
    pub const NO_RESULT: u8 = 3;
}

#[derive(Parser)]
#[command(name = "nvd-client")]
#[command(author, version, about = "Query the NVD CVE and CPE-match APIs")]
struct Cli {
    /// NVD API key (overrides NVD_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Proxy URL for this invocation, e.g. socks5://127.0.0.1:9050
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Write output to file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct PageArgs {
    /// Results per page (default: 2000 for CVEs, 500 for CPE matches)
    #[arg(long)]
    per_page: Option<u32>,

    /// Index of the first result
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

impl PageArgs {
    fn pagination(self, default: Pagination) -> Pagination {
        Pagination::new(
            self.per_page.unwrap_or(default.results_per_page),
            self.offset,
        )
    }
}

#[derive(Args, Clone)]
struct DateArgs {
    /// Start of the publication window (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS.mmm)
    #[arg(long)]
    pub_start: Option<String>,

    /// End of the publication window
    #[arg(long)]
    pub_end: Option<String>,

    /// Start of the last-modified window
    #[arg(long)]
    mod_start: Option<String>,

    /// End of the last-modified window
    #[arg(long)]
    mod_end: Option<String>,
}

impl DateArgs {
    fn filters(self) -> DateFilters {
        DateFilters {
            publish_start_date: given(self.pub_start),
            publish_end_date: given(self.pub_end),
            modify_start_date: given(self.mod_start),
            modify_end_date: given(self.mod_end),
        }
    }
}

/// Blank flags (`--pub-start ""`) count as not given.
fn given(value: Option<String>) -> Option<DateInput> {
    value.filter(|v| !v.trim().is_empty()).map(Into::into)
}

#[derive(Subcommand)]
enum Commands {
    /// List all CVEs, one page at a time
    All {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Fetch a single CVE by ID
    Cve {
        /// CVE identifier, e.g. CVE-2021-44228
        id: String,
    },

    /// List CVEs by publication and/or modification window
    Date {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        dates: DateArgs,
    },

    /// List CVEs affecting a CPE name
    Cpe {
        /// CPE 2.3 name, e.g. cpe:2.3:a:apache:log4j:2.14.1:*:*:*:*:*:*:*
        name: String,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        dates: DateArgs,
    },

    /// List CPE match strings for a CVE
    Cpes {
        /// CVE identifier
        cve_id: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Search CPE match strings by criteria
    Criteria {
        /// Criteria text, e.g. cpe:2.3:a:apache:log4j
        text: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Fetch CPE match strings by match criteria ID
    CriteriaId {
        /// Match criteria UUID
        id: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    // Still usable when the config file itself is broken.
    if let Commands::Config { init, path } = cli.command {
        logging::init(cli.verbose, cli.log_file.as_deref())?;
        handle_config(init, path)?;
        return Ok(exit_codes::SUCCESS);
    }

    let mut config = Config::load()?;
    if let Some(key) = cli.api_key.clone() {
        config.api_key = Some(key);
    }

    logging::init(cli.verbose, cli.log_file.as_deref().or(config.log_file.as_deref()))?;

    let format_str = cli.format.clone().unwrap_or_else(|| config.default_format.clone());
    let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

    let api = NvdApi::from_config(&config)?;
    let api = match cli.proxy.as_deref() {
        Some(proxy) => api.via_proxy(proxy)?,
        None => api,
    };

    let is_interactive = format == OutputFormat::Table && cli.output.is_none();
    let spinner = is_interactive.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Querying NVD...");
        pb
    });

    let (endpoint, result) = execute(&api, cli.command).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(doc) => {
            write_output(&doc, endpoint, format, cli.output)?;
            Ok(exit_codes::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            eprintln!("Error: {}", e);
            Ok(exit_codes::INVALID_INPUT)
        }
        Err(e) => {
            eprintln!("No result: {}", e);
            Ok(exit_codes::NO_RESULT)
        }
    }
}

async fn execute(api: &NvdApi, command: Commands) -> (Endpoint, Result<Value, NvdError>) {
    match command {
        Commands::All { page } => (
            Endpoint::Cves,
            api.get_all_cves(page.pagination(Pagination::cves())).await,
        ),
        Commands::Cve { id } => (Endpoint::Cves, api.get_cve_by_id(&id).await),
        Commands::Date { page, dates } => (
            Endpoint::Cves,
            api.get_cve_by_date(page.pagination(Pagination::cves()), &dates.filters())
                .await,
        ),
        Commands::Cpe { name, page, dates } => (
            Endpoint::Cves,
            api.get_cve_by_cpe(&name, page.pagination(Pagination::cves()), &dates.filters())
                .await,
        ),
        Commands::Cpes { cve_id, page } => (
            Endpoint::CpeMatch,
            api.get_cpes_by_cve(&cve_id, page.pagination(Pagination::cpe_matches()))
                .await,
        ),
        Commands::Criteria { text, page } => (
            Endpoint::CpeMatch,
            api.get_cpes_by_criteria(&text, page.pagination(Pagination::cpe_matches()))
                .await,
        ),
        Commands::CriteriaId { id, page } => (
            Endpoint::CpeMatch,
            api.get_cpes_by_criteria_id(&id, page.pagination(Pagination::cpe_matches()))
                .await,
        ),
        // Handled before the client is built.
        Commands::Config { .. } => unreachable!("config command does not query NVD"),
    }
}

fn write_output(
    doc: &Value,
    endpoint: Endpoint,
    format: OutputFormat,
    output_file: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = output_file {
        let text = format_result_to_string(doc, endpoint, format)?;
        std::fs::write(&path, text)?;
        eprintln!("Results written to: {}", path.display());
    } else {
        print_result(doc, endpoint, format)?;
    }
    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'nvd-client config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
