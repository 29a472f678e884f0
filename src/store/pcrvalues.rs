// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::quote::HashAlg;
use std::collections::BTreeMap;

// IMPLEMENTATION_PCR on every shipping TPM
const PCR_COUNT: u8 = 24;

/// A set of PCR digests, one map per bank, serialised as JSON with decimal
/// register indices for keys and lowercase hex digests for values:
///
/// ```json
/// {
///     "sha256": {
///         "0": "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925",
///         "7": "…"
///     },
///     "sha1": { "0": "…" }
/// }
/// ```
///
/// The same shape serves two roles: the admin-configured baseline (the
/// acceptable platform state) and the register values a device reports next
/// to its quote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PcrValues {
    banks: BTreeMap<HashAlg, BTreeMap<u8, Vec<u8>>>,
}

impl PcrValues {
    /// Returns a new empty PcrValues set
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse a PCR value set from JSON, rejecting unknown banks,
    /// out-of-range indices and digests whose width does not match their
    /// bank
    pub fn parse(j: &str) -> Result<Self, Error> {
        let raw: BTreeMap<String, BTreeMap<String, String>> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        let mut v = PcrValues::new();

        for (bank_name, regs) in raw.iter() {
            let bank = HashAlg::from_name(bank_name)
                .ok_or_else(|| Error::Sema(format!("unknown PCR bank {bank_name}")))?;

            for (index_str, digest_hex) in regs.iter() {
                let index: u8 = index_str.parse().map_err(|_| {
                    Error::Sema(format!("bad PCR index {index_str} in bank {bank_name}"))
                })?;

                let digest = hex::decode(digest_hex).map_err(|e| {
                    Error::Syntax(format!("PCR {bank_name}:{index_str} is not hex: {e}"))
                })?;

                v.insert(bank, index, digest)?;
            }
        }

        Ok(v)
    }

    /// Set the digest for one register, validating index range and digest
    /// width
    pub fn insert(&mut self, bank: HashAlg, index: u8, digest: Vec<u8>) -> Result<(), Error> {
        if index >= PCR_COUNT {
            return Err(Error::Sema(format!(
                "PCR index {index} out of range (0..={})",
                PCR_COUNT - 1
            )));
        }

        if digest.len() != bank.digest_len() {
            return Err(Error::Sema(format!(
                "PCR {bank}:{index}: expecting {} bytes, got {}",
                bank.digest_len(),
                digest.len()
            )));
        }

        self.banks.entry(bank).or_default().insert(index, digest);

        Ok(())
    }

    pub fn remove(&mut self, bank: HashAlg, index: u8) -> Option<Vec<u8>> {
        self.banks.get_mut(&bank)?.remove(&index)
    }

    /// Digest of one register, if present
    pub fn get(&self, bank: HashAlg, index: u8) -> Option<&[u8]> {
        self.banks.get(&bank)?.get(&index).map(Vec::as_slice)
    }

    /// All (bank, index, digest) triples, banks and indices ascending
    pub fn entries(&self) -> impl Iterator<Item = (HashAlg, u8, &[u8])> + '_ {
        self.banks.iter().flat_map(|(bank, regs)| {
            regs.iter()
                .map(move |(index, digest)| (*bank, *index, digest.as_slice()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.banks.values().all(BTreeMap::is_empty)
    }
}
