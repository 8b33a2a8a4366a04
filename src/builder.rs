use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::checksum::write_sha256sum;
use crate::config::{BuildConfig, Mode};
use crate::custom::apply_overrides;
use crate::dat::{self, geodat};
use crate::error::{BuildError, Result};
use crate::geoip;
use crate::geosite::ListRegistry;

/// Run the build selected by `config.mode` and return the written dataset
/// path. The override file is applied first.
pub fn run(config: &BuildConfig) -> Result<PathBuf> {
    apply_overrides(config)?;
    match config.mode {
        Mode::Geoip => build_geoip(config),
        Mode::Geosite => build_geosite(config),
    }
}

/// Parse, resolve and export the domain lists under `config.data_dir`.
pub fn compile_geosite(config: &BuildConfig) -> Result<geodat::GeoSiteList> {
    let mut registry = ListRegistry::load_dir(&config.data_dir)?;
    registry.resolve()?;
    Ok(registry.to_geosite_list(&config.exclude_attrs))
}

/// Collect the IP lists under `config.data_dir`, `PRIVATE` included.
pub fn compile_geoip(config: &BuildConfig) -> Result<geodat::GeoIpList> {
    let lists = geoip::collect_dir(&config.data_dir)?;
    Ok(geoip::to_geoip_list(&lists))
}

/// Build and write the geosite dataset with its checksum sidecar.
pub fn build_geosite(config: &BuildConfig) -> Result<PathBuf> {
    let list = compile_geosite(config)?;
    let path = write_dataset(config, &dat::encode_geosite(&list)?)?;

    let entries = dat::load_geosite(&path)?.len();
    info!(
        "{} has been generated successfully in '{}' ({} entries)",
        config.dat_name(),
        config.output_dir.display(),
        entries
    );
    Ok(path)
}

/// Build and write the geoip dataset with its checksum sidecar.
pub fn build_geoip(config: &BuildConfig) -> Result<PathBuf> {
    let list = compile_geoip(config)?;
    let path = write_dataset(config, &dat::encode_geoip(&list)?)?;

    let entries = dat::load_geoip(&path)?.len();
    info!(
        "{} has been generated successfully in '{}' ({} entries)",
        config.dat_name(),
        config.output_dir.display(),
        entries
    );
    Ok(path)
}

fn write_dataset(config: &BuildConfig, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir).map_err(|e| BuildError::io(&config.output_dir, e))?;

    let path = config.output_path();
    fs::write(&path, bytes).map_err(|e| BuildError::io(&path, e))?;
    let sidecar = write_sha256sum(&path)?;
    info!("Wrote checksum to '{}'", sidecar.display());
    Ok(path)
}
