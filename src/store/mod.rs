// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide verifier configuration, loaded once at startup: the
//! attestation keys devices were provisioned with, and the PCR baselines
//! their measured state is appraised against.  Nothing in here is mutated
//! per request, so one store instance can serve any number of concurrent
//! verifications.

pub use self::ak::Ak;
pub use self::ak::SignatureScheme;
pub use self::errors::Error;
pub use self::ikeystore::IKeyStore;
pub use self::memo_keystore::MemoKeyStore;
pub use self::pcrvalues::PcrValues;

mod ak;
mod errors;
mod ikeystore;
mod memo_keystore;
mod pcrvalues;
