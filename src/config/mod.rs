//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! The configuration handling code
//!
//! The configuration is loaded from `config.toml` (or the file passed via `--config`) and
//! environment variables prefixed with `FLAMESTORE_`, deserialized into a
//! [`NotValidatedConfiguration`] and checked by [`NotValidatedConfiguration::validate`].

mod configuration;
pub use configuration::*;

mod not_validated;
pub use not_validated::*;

mod util;
