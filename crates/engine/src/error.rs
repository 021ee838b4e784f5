// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors that can abort a single dispatch/resumption attempt. Every
/// constructor site also releases whatever workspace it already created.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("agent pool is at capacity")]
    AtCapacity,

    #[error("failed to spawn assistant subprocess: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] swarm_storage::StoreError),

    #[error("forge error: {0}")]
    Forge(#[from] swarm_adapters::ForgeError),

    #[error("no such worker {0}")]
    UnknownWorker(String),
}
