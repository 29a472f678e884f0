// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

//! TPM 2.0 attestation quote verification and appraisal.
//!
//! This crate provides an API to decode, verify and appraise attestation
//! quotes produced by a TPM 2.0 device over its Platform Configuration
//! Registers (PCRs).  For detailed information about the quote format, see
//! §10.12.12 (TPMS_ATTEST) of the TPM 2.0 Library [Part 2] specification.
//!
//! The API allows:
//! * Decoding a marshalled TPMS_ATTEST quote structure
//! * Cryptographically verifying the quote signature with the device's
//!   attestation key (AK)
//! * Appraising the quoted PCR state against a user-supplied baseline,
//!   bound to a per-request challenge nonce
//!
//! [Part 2]: https://trustedcomputinggroup.org/resource/tpm-library-specification/

pub mod quote;
pub mod store;
