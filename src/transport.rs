//! Moving key files between the shared store and local staging.

use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail, ensure};
use log::info;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReceipt {
    pub location: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

pub trait Transport {
    /// Copies `identifier` from the store into `staging`, returning the local path.
    fn fetch(&self, identifier: &str, staging: &Path) -> Result<PathBuf>;
    /// Copies `local` into `destination` within the store.
    fn store(&self, local: &Path, destination: &str) -> Result<StoreReceipt>;
}

/// A store rooted at a directory, e.g. a mounted drive or synced folder.
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
    root: PathBuf,
}

impl DirectoryTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        ensure!(
            relative
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_))),
            "Store path {relative:?} must be relative and must not leave the store"
        );
        Ok(self.root.join(relative))
    }
}

pub fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let mut reader =
        BufReader::new(File::open(path).with_context(|| format!("Opening {path:?}"))?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Reading {path:?}"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }
    let digest = hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok((digest, total))
}

fn copy_verified(source: &Path, target: &Path) -> Result<StoreReceipt> {
    fs::copy(source, target).with_context(|| format!("Copying {source:?} to {target:?}"))?;
    let (expected, _) = sha256_file(source)?;
    let (actual, bytes) = sha256_file(target)?;
    if expected != actual {
        bail!("Copy of {source:?} to {target:?} is not byte-identical");
    }
    Ok(StoreReceipt {
        location: target.to_path_buf(),
        bytes,
        sha256: actual,
    })
}

impl Transport for DirectoryTransport {
    fn fetch(&self, identifier: &str, staging: &Path) -> Result<PathBuf> {
        let source = self.resolve(identifier)?;
        ensure!(source.is_file(), "Key file {source:?} does not exist in the store");
        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow!("Key identifier '{identifier}' has no file name"))?;
        fs::create_dir_all(staging).with_context(|| format!("Creating {staging:?}"))?;
        let target = staging.join(file_name);
        let receipt = copy_verified(&source, &target)?;
        info!(
            "✓ Fetched {:?} ({} bytes) into {:?}",
            source, receipt.bytes, staging
        );
        Ok(target)
    }

    fn store(&self, local: &Path, destination: &str) -> Result<StoreReceipt> {
        let dir = if destination.is_empty() {
            self.root.clone()
        } else {
            self.resolve(destination)?
        };
        let file_name = local
            .file_name()
            .ok_or_else(|| anyhow!("Local path {local:?} has no file name"))?;
        fs::create_dir_all(&dir).with_context(|| format!("Creating {dir:?}"))?;
        let target = dir.join(file_name);
        ensure!(
            !target.exists(),
            "Refusing to overwrite {target:?} in the store"
        );
        let receipt = copy_verified(local, &target)?;
        info!("✓ Stored {:?} as {:?}", local, receipt.location);
        Ok(receipt)
    }
}
