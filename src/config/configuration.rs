//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use getset::Getters;

use crate::config::NotValidatedConfiguration;

/// A validated configuration
#[derive(Debug, Getters)]
pub struct Configuration {
    pub(in crate::config) inner: NotValidatedConfiguration,

    #[getset(get = "pub")]
    pub(in crate::config) file_io_timeout: Duration,

    #[getset(get = "pub")]
    pub(in crate::config) github_timeout: Duration,
}

impl Deref for Configuration {
    type Target = NotValidatedConfiguration;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Configuration {
    /// Load the configuration from `path` and the `FLAMESTORE_` environment
    pub fn load(path: &Path) -> Result<Configuration> {
        ::config::Config::builder()
            .add_source(::config::File::from(path).required(true))
            .add_source(::config::Environment::with_prefix("FLAMESTORE").prefix_separator("_").separator("__"))
            .build()
            .with_context(|| anyhow::anyhow!("Reading configuration from {}", path.display()))?
            .try_deserialize::<NotValidatedConfiguration>()
            .context("Parsing configuration")?
            .validate()
            .context("Validating configuration")
    }
}
