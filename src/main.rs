use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geodat_builder::config::parse_exclude_attrs;
use geodat_builder::{run, BuildConfig, Mode};

/// Build V2Ray geoip.dat / geosite.dat files from rule directories.
#[derive(Parser, Debug)]
#[command(name = "geodat-builder", version, about)]
struct Args {
    /// Dataset to build
    #[arg(long, value_enum)]
    mode: Mode,

    /// Directory of rule files
    #[arg(long = "datapath", default_value = "./data")]
    data_path: PathBuf,

    /// Name of the generated dat file (geoip.dat / geosite.dat by default)
    #[arg(long = "datname")]
    dat_name: Option<String>,

    /// Output directory for the generated files
    #[arg(long = "outputpath", default_value = "./publish")]
    output_path: PathBuf,

    /// Direct rule file edited by the override file's [direct] section
    #[arg(long, default_value = "./domain_data/cn")]
    direct: PathBuf,

    /// Proxy rule file edited by the override file's [proxy] section
    #[arg(long, default_value = "./domain_data/gfw")]
    proxy: PathBuf,

    /// Override file (TOML)
    #[arg(long, default_value = "./custom.toml")]
    custom: PathBuf,

    /// Attributes to drop per list, e.g. `cn@ads,gfw@cn@ads`
    #[arg(long = "exclude-attrs", default_value = "")]
    exclude_attrs: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    let exclude_attrs = match parse_exclude_attrs(&args.exclude_attrs) {
        Ok(attrs) => attrs,
        Err(e) => {
            error!("Failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = BuildConfig {
        mode: args.mode,
        data_dir: args.data_path,
        output_dir: args.output_path,
        dat_name: args.dat_name,
        direct_path: args.direct,
        proxy_path: args.proxy,
        custom_path: args.custom,
        exclude_attrs,
    };

    match run(&config) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
