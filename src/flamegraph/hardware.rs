//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Hardware descriptions sent along with a flamegraph
//!
//! A flamegraph was recorded either on a single machine or on a cluster. Both payload types are
//! reduced to a JSON document, whose canonical hash identifies the hardware row in the database.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::flamegraph::FlamegraphError;
use crate::util::hash::content_hash;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub name: String,
    pub os_name: String,
    pub os_version: String,
    pub architecture_name: String,
    pub kernel_name: String,
    pub cpu_model_name: String,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_core_count: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_thread_count: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_l1d_cache_bytes: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_l1i_cache_bytes: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_l2_cache_bytes: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_l3_cache_bytes: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub cpu_frequency_max_hz: i64,

    #[serde(deserialize_with = "crate::util::serde_int::deserialize")]
    pub memory_bytes: i64,

    #[serde(default, deserialize_with = "crate::util::serde_int::deserialize")]
    pub gpu_count: i64,

    #[serde(default)]
    pub gpu_product_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,

    /// Attributes identifying the cluster
    pub info: Map<String, Value>,

    /// Attributes that describe the cluster but do not identify it
    #[serde(default)]
    pub optional_info: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HardwarePayload {
    Machine(MachineInfo),
    Cluster(ClusterInfo),
}

impl HardwarePayload {
    pub const KIND_MACHINE: &'static str = "machine";
    pub const KIND_CLUSTER: &'static str = "cluster";

    /// Parse exactly one of the two raw payloads
    ///
    /// Supplying both or neither is an error, as is a payload that does not match its schema.
    pub fn from_raw(machine_info: Option<Value>, cluster_info: Option<Value>) -> Result<Self, FlamegraphError> {
        let payload = match (machine_info, cluster_info) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(FlamegraphError::validation(
                    "Exactly one of machine_info and cluster_info must be provided",
                ))
            }
            (Some(m), None) => serde_json::from_value(m)
                .map(HardwarePayload::Machine)
                .map_err(|e| FlamegraphError::validation(format!("Invalid machine_info: {e}")))?,
            (None, Some(c)) => serde_json::from_value(c)
                .map(HardwarePayload::Cluster)
                .map_err(|e| FlamegraphError::validation(format!("Invalid cluster_info: {e}")))?,
        };

        if payload.name().trim().is_empty() {
            return Err(FlamegraphError::validation(format!(
                "{}_info.name must not be empty",
                payload.kind()
            )));
        }

        Ok(payload)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HardwarePayload::Machine(_) => Self::KIND_MACHINE,
            HardwarePayload::Cluster(_) => Self::KIND_CLUSTER,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HardwarePayload::Machine(m) => &m.name,
            HardwarePayload::Cluster(c) => &c.name,
        }
    }

    /// The payload as it is stored in the `info` column
    pub fn info(&self) -> Value {
        let r = match self {
            HardwarePayload::Machine(m) => serde_json::to_value(m),
            HardwarePayload::Cluster(c) => serde_json::to_value(c),
        };

        // Both types consist of strings, integers and JSON maps only
        r.unwrap_or(Value::Null)
    }

    /// Content-derived key of this hardware
    ///
    /// For clusters only `name` and `info` count, `optional_info` is stored but not part of the key.
    pub fn hash(&self) -> String {
        let identity = match self {
            HardwarePayload::Machine(_) => self.info(),
            HardwarePayload::Cluster(c) => {
                let mut doc = Map::new();
                doc.insert("name".to_string(), Value::String(c.name.clone()));
                doc.insert("info".to_string(), Value::Object(c.info.clone()));
                Value::Object(doc)
            }
        };

        let mut doc = Map::new();
        doc.insert("kind".to_string(), Value::String(self.kind().to_string()));
        doc.insert("info".to_string(), identity);
        content_hash(&Value::Object(doc))
    }
}
