// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Page token shared by all clusters of a clustered list.
//!
//! Each cluster paginates independently, so the token carries one server
//! continue token per cluster that still has data. A cluster recorded without
//! a continue token starts over from its first page. Clusters that are missing
//! from a decoded token have been read to the end.

use crate::error::{LookoutError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageToken {
    continues: BTreeMap<String, Option<String>>,
}

impl PageToken {
    /// Decode a token handed out by [`PageToken::encode`]. An empty string is
    /// the first page.
    pub fn decode(token: &str) -> Result<Option<Self>> {
        if token.is_empty() {
            return Ok(None);
        }

        let bytes = STANDARD
            .decode(token)
            .map_err(|e| LookoutError::InvalidPageToken(e.to_string()))?;
        let continues = serde_json::from_slice(&bytes)
            .map_err(|e| LookoutError::InvalidPageToken(e.to_string()))?;

        Ok(Some(Self { continues }))
    }

    /// Encode the token, or an empty string when no cluster has more data
    pub fn encode(&self) -> String {
        if self.continues.is_empty() {
            return String::new();
        }

        // A map of strings always serializes
        let json = serde_json::to_vec(&self.continues).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Record where `cluster` should resume. Empty tokens mean the cluster is
    /// exhausted and are not recorded.
    pub fn set(&mut self, cluster: &str, continue_token: Option<&str>) {
        match continue_token {
            Some(token) if !token.is_empty() => {
                self.continues.insert(cluster.to_string(), Some(token.to_string()));
            }
            _ => {
                self.continues.remove(cluster);
            }
        }
    }

    /// Keep `cluster` in the token so the next page queries it again from
    /// `from`, or from its first page when there is no continue token yet.
    pub fn retry(&mut self, cluster: &str, from: Option<&str>) {
        self.continues.insert(cluster.to_string(), from.map(String::from));
    }

    /// Whether `cluster` still has to be queried
    pub fn contains(&self, cluster: &str) -> bool {
        self.continues.contains_key(cluster)
    }

    /// Continue token for `cluster`, `None` when it is absent or starts over
    pub fn get(&self, cluster: &str) -> Option<&str> {
        self.continues.get(cluster)?.as_deref()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &str> {
        self.continues.keys().map(String::as_str)
    }
}
