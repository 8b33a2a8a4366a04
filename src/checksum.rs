use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{BuildError, Result};

/// Lower-case hex SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Write `<path>.sha256sum` holding `<hash>  <file name>` for the file at
/// `path`, and return the sidecar's path.
pub fn write_sha256sum(path: &Path) -> Result<PathBuf> {
    let data = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".sha256sum");
    let sidecar = PathBuf::from(sidecar);

    let line = format!("{}  {}", sha256_hex(&data), file_name);
    fs::write(&sidecar, line).map_err(|e| BuildError::io(&sidecar, e))?;
    Ok(sidecar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_write_sha256sum() {
        let dir = std::env::temp_dir().join(format!("geodat_checksum_{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("geoip.dat");
        fs::write(&path, b"abc").unwrap();

        let sidecar = write_sha256sum(&path).unwrap();
        assert_eq!(sidecar, dir.join("geoip.dat.sha256sum"));
        assert_eq!(
            fs::read_to_string(&sidecar).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad  geoip.dat"
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
