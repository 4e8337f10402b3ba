//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;

/// Hex encoded SHA-256 of the compact JSON rendering of `value`
///
/// `serde_json::Map` keeps its keys sorted, so the rendering does not depend on the order in
/// which a client sent them.
pub fn content_hash(value: &Value) -> String {
    hex::encode(Sha256::digest(value.to_string()))
}
