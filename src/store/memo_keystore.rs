// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::ak::Ak;
use super::errors::Error;
use super::IKeyStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// The store where the enrolled attestation keys are stashed.  Keys are
/// indexed by their key-id.
#[derive(Default)]
pub struct MemoKeyStore {
    p: RwLock<HashMap<String, Ak>>,
}

impl MemoKeyStore {
    /// Returns a new empty MemoKeyStore
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    /// Add to an existing (and possibly empty) MemoKeyStore the attestation
    /// keys loaded from the given JSON file
    pub fn load_json(&mut self, j: &str) -> Result<(), Error> {
        let mut aks: Vec<Ak> = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        for ak in aks.iter_mut() {
            ak.parse_pkey()?;
            self.p
                .write()
                .unwrap()
                .insert(ak.key_id.clone(), ak.clone());
        }

        Ok(())
    }
}

impl IKeyStore for MemoKeyStore {
    /// Lookup an attestation key from the store given the corresponding key-id
    fn lookup(&self, key_id: &str) -> Option<Ak> {
        return self.p.read().unwrap().get(key_id).cloned();
    }
}
