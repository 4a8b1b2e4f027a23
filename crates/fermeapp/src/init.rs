//! # Context Initialization
//!
//! Builds everything a UI needs from a loaded [`FermeConfig`]:
//!
//! 1. Resolve the data file (`data_file` setting, else the OS data directory).
//! 2. Open the [`FileStore`] over it with the read-only simulation flag. A missing file
//!    is seeded, and written only when not simulating.
//! 3. Wrap the store in a [`FermeApi`] with the configured weather source.

use crate::api::FermeApi;
use crate::config::FermeConfig;
use crate::error::Result;
use crate::store::{FileStore, FsBackend};
use std::path::PathBuf;

pub struct FermeContext {
    pub api: FermeApi<FsBackend>,
    pub config: FermeConfig,
    pub data_file: PathBuf,
}

pub fn initialize(config: FermeConfig) -> Result<FermeContext> {
    let data_file = config.data_file()?;
    tracing::debug!(path = %data_file.display(), "opening store");

    let store = FileStore::open_with(FsBackend::new(&data_file), config.emulate_read_only);
    let api = FermeApi::new(store)
        .with_advisory(config.advisory())
        .with_strict_queries(config.strict_queries);

    Ok(FermeContext {
        api,
        config,
        data_file,
    })
}
