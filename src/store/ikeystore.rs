// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::ak::Ak;

pub trait IKeyStore {
    /// Lookup an attestation key given the identifier it was enrolled under
    fn lookup(&self, key_id: &str) -> Option<Ak>;
}
