//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum FlamegraphError {
    #[error("{0}")]
    Validation(String),

    #[error("Flamegraph {0} not found")]
    NotFound(i32),

    #[error("Flamegraph {0} has no SVG file")]
    NoFile(i32),

    #[error("{0}")]
    InvalidFile(String),

    #[error("Storage failure: {0:#}")]
    Storage(anyhow::Error),

    #[error("Commit metadata lookup failed: {0:#}")]
    UpstreamLookup(anyhow::Error),

    #[error("Database failure: {0:#}")]
    Database(anyhow::Error),
}

impl FlamegraphError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        FlamegraphError::Validation(msg.into())
    }

    pub fn invalid_file<S: Into<String>>(msg: S) -> Self {
        FlamegraphError::InvalidFile(msg.into())
    }

    /// Stable, machine readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            FlamegraphError::Validation(_) => "validation_error",
            FlamegraphError::NotFound(_) | FlamegraphError::NoFile(_) => "not_found",
            FlamegraphError::InvalidFile(_) => "invalid_file",
            FlamegraphError::Storage(_) => "storage_error",
            FlamegraphError::UpstreamLookup(_) => "upstream_lookup_error",
            FlamegraphError::Database(_) => "database_error",
        }
    }
}

impl From<diesel::result::Error> for FlamegraphError {
    fn from(e: diesel::result::Error) -> Self {
        FlamegraphError::Database(anyhow::Error::from(e))
    }
}

impl From<diesel::r2d2::PoolError> for FlamegraphError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        FlamegraphError::Database(anyhow::Error::from(e))
    }
}

impl From<tokio::task::JoinError> for FlamegraphError {
    fn from(e: tokio::task::JoinError) -> Self {
        FlamegraphError::Database(anyhow::Error::from(e).context("Database task aborted"))
    }
}
