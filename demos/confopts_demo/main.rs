//! # confopts demo application
//!
//! A sample service that registers options, reads its config files and prints
//! what it resolved. It exists to demonstrate and manually verify confopts.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example confopts_demo -- show
//! cargo run --example confopts_demo -- config --config-file zen.conf list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                   |
//! |-----------------------|----------------------------------------------------------------------|
//! | Defaults only         | `cargo run --example confopts_demo -- show`                          |
//! | Discovered files      | Place `confopts-demo.conf` under `~/.confopts-demo/` or `/etc/confopts-demo/` |
//! | Explicit files        | `cargo run --example confopts_demo -- show --config-file a.conf --config-file b.conf` |
//! | `config list`         | `cargo run --example confopts_demo -- config list`                   |
//! | `config get`          | `cargo run --example confopts_demo -- config get education.school`   |
//! | `config sections`     | `cargo run --example confopts_demo -- config sections`               |
//! | Logged option dump    | `RUST_LOG=info cargo run --example confopts_demo -- show`            |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use confopts::{
    ConfigArgs, ConfigOpts, IpVersion, Opt, OptGroup, default_search_paths, find_config_files,
};

const PROJECT: &str = "confopts-demo";

/// confopts demo, a sample service showing option registration and parsing.
#[derive(Parser, Debug)]
#[command(name = "confopts-demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved `education` group and the API address.
    Show {
        /// Config file to read instead of the discovered ones.
        #[arg(long = "config-file")]
        config_file: Vec<PathBuf>,
    },
    /// Inspect the configuration (list, get, sections).
    Config(ConfigArgs),
}

#[derive(Debug, Deserialize)]
struct Education {
    school: String,
    classes: String,
    number_of_students: u32,
}

fn register(conf: &ConfigOpts) -> Result<(), confopts::ConfigError> {
    conf.register_opts(
        [
            Opt::boolean("debug").default(false).help("Enable debug output"),
            Opt::string("admin-token").secret(true).help("Token for admin calls"),
        ],
        None,
    )?;

    conf.register_opts_in(
        [
            Opt::string("school").required(true).default("bupt"),
            Opt::string("classes").default("grade 3"),
            Opt::integer_range("number-of-students", Some(1), Some(500)).default(50),
        ],
        OptGroup::new("education")
            .title("Education options")
            .help("Options of the education service"),
    )?;

    conf.register_opts(
        [
            Opt::ip("ip", Some(IpVersion::V4)).default("127.0.0.1"),
            Opt::integer_range("port", Some(1), Some(65535)).default(8080),
        ],
        Some("api"),
    )?;
    Ok(())
}

/// Explicit files win; otherwise use whatever the default search paths hold.
fn config_files(explicit: Vec<PathBuf>) -> Vec<PathBuf> {
    if explicit.is_empty() {
        find_config_files(PROJECT, &default_search_paths(PROJECT))
    } else {
        explicit
    }
}

fn show(conf: &ConfigOpts) -> Result<(), confopts::ConfigError> {
    let education: Education = conf.group("education")?.deserialize()?;
    println!("school:             {}", education.school);
    println!("classes:            {}", education.classes);
    println!("number of students: {}", education.number_of_students);

    let api = conf.group("api")?;
    let ip: Option<String> = api.get_as("ip")?;
    let port: Option<u16> = api.get_as("port")?;
    println!(
        "api:                {}:{}",
        ip.unwrap_or_default(),
        port.unwrap_or_default()
    );
    Ok(())
}

fn run(cli: Cli) -> Result<(), confopts::ConfigError> {
    let conf = ConfigOpts::new();
    register(&conf)?;

    match cli.command {
        Commands::Show { config_file } => {
            conf.parse(&config_files(config_file))?;
            conf.log_opt_values(tracing::Level::INFO);
            show(&conf)
        }
        Commands::Config(args) => {
            conf.parse(&config_files(args.config_files()))?;
            println!("{}", conf.handle(&args.into_action())?);
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
