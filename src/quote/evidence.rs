// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::attest::Attest;
use super::common::{ct_eq, HashAlg};
use super::errors::Error;
use crate::store::{Ak, PcrValues};
use openssl::hash::Hasher;

/// Why a quote was rejected.  Callers facing external clients must surface
/// only the binary outcome and keep the reason for internal logs: a detailed
/// answer would hand an adversary an oracle separating signature, nonce and
/// PCR failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("malformed quote structure: {0}")]
    Malformed(Error),
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error("nonce mismatch")]
    NonceMismatch,
    #[error("baseline entry {bank}:{index} is not covered by the quote's selection")]
    PolicyBankMissing { bank: HashAlg, index: u8 },
    #[error("PCR {bank}:{index} does not match the baseline")]
    PcrMismatch { bank: HashAlg, index: u8 },
    #[error("reported PCR values do not match the quoted composite digest")]
    CompositeMismatch,
    #[error("no reported value for selected PCR {bank}:{index}")]
    ReportedPcrMissing { bank: HashAlg, index: u8 },
    #[error("PCR {bank}:{index} is quoted but not in the baseline")]
    UndeclaredPcr { bank: HashAlg, index: u8 },
    #[error("internal fault: {0}")]
    Internal(String),
}

/// The outcome of one appraisal.  Externally observable behaviour is binary;
/// the reason is for observability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(r) => Some(r),
        }
    }
}

/// Collects all the attacker-supplied components of one attestation attempt:
/// the raw quote message, the signature over it, and the per-register values
/// the device reported alongside the quote.
#[derive(Debug, Clone)]
pub struct Evidence {
    /// Marshalled TPMS_ATTEST, the exact bytes the AK signed
    pub message: Vec<u8>,
    /// Raw signature over `message`
    pub signature: Vec<u8>,
    /// Device-reported register values; trusted only after they have been
    /// bound to the quoted composite digest
    pub pcrs: PcrValues,
}

impl Evidence {
    pub fn new(message: Vec<u8>, signature: Vec<u8>, pcrs: PcrValues) -> Self {
        Self {
            message,
            signature,
            pcrs,
        }
    }

    /// Decode the quote message into its structured claim.  Pure; does not
    /// authenticate anything.
    pub fn decode_claims(&self) -> Result<Attest, Error> {
        Attest::decode(&self.message)
    }

    /// Verify the AK signature over the exact raw message bytes, never over
    /// a re-serialised form
    pub fn verify_signature(&self, ak: &Ak) -> bool {
        ak.verify(&self.message, &self.signature)
    }

    /// Appraise the evidence: decode, verify the signature, check nonce
    /// freshness, bind the reported register values to the quoted composite
    /// digest, then compare them against the baseline.  Terminal on first
    /// failure.
    ///
    /// Claim fields are not acted upon before the signature over the raw
    /// message has validated; an attacker can author arbitrary claim
    /// content, so anything extracted earlier is untrustworthy.
    pub fn appraise(&self, ak: &Ak, nonce: &[u8], baseline: &PcrValues, strict: bool) -> Verdict {
        let claims = match self.decode_claims() {
            Ok(c) => c,
            Err(e) => return Verdict::Rejected(RejectReason::Malformed(e)),
        };

        if !self.verify_signature(ak) {
            return Verdict::Rejected(RejectReason::SignatureInvalid);
        }

        if !ct_eq(&claims.extra_data, nonce) {
            return Verdict::Rejected(RejectReason::NonceMismatch);
        }

        if let Err(r) = self.check_binding(&claims, ak.hash()) {
            return Verdict::Rejected(r);
        }

        if let Err(r) = self.check_baseline(&claims, baseline, strict) {
            return Verdict::Rejected(r);
        }

        Verdict::Accepted
    }

    /// Recompute the composite PCR digest from the reported values, walking
    /// the claim's selection list in order and each bank's registers in
    /// ascending index order, exactly as the TPM did, and compare it against
    /// the quoted digest.  Until this passes, the reported values are just
    /// claims.
    fn check_binding(&self, claims: &Attest, hash: HashAlg) -> Result<(), RejectReason> {
        let mut hasher = Hasher::new(hash.message_digest())
            .map_err(|e| RejectReason::Internal(e.to_string()))?;

        for sel in &claims.pcr_selections {
            for index in sel.indices() {
                let v = self
                    .pcrs
                    .get(sel.bank, index)
                    .ok_or(RejectReason::ReportedPcrMissing {
                        bank: sel.bank,
                        index,
                    })?;

                hasher
                    .update(v)
                    .map_err(|e| RejectReason::Internal(e.to_string()))?;
            }
        }

        let sum = hasher
            .finish()
            .map_err(|e| RejectReason::Internal(e.to_string()))?;

        if !ct_eq(&sum, &claims.pcr_digest) {
            return Err(RejectReason::CompositeMismatch);
        }

        Ok(())
    }

    /// Compare the (now bound) reported values against the baseline.  The
    /// baseline is a minimum bar: registers quoted beyond it are ignored
    /// unless `strict` asks for an exact match.
    fn check_baseline(
        &self,
        claims: &Attest,
        baseline: &PcrValues,
        strict: bool,
    ) -> Result<(), RejectReason> {
        for (bank, index, expected) in baseline.entries() {
            if !claims.selects(bank, index) {
                return Err(RejectReason::PolicyBankMissing { bank, index });
            }

            // selected registers are guaranteed reported by check_binding
            let got = self
                .pcrs
                .get(bank, index)
                .ok_or(RejectReason::ReportedPcrMissing { bank, index })?;

            if !ct_eq(got, expected) {
                return Err(RejectReason::PcrMismatch { bank, index });
            }
        }

        if strict {
            for sel in &claims.pcr_selections {
                for index in sel.indices() {
                    if baseline.get(sel.bank, index).is_none() {
                        return Err(RejectReason::UndeclaredPcr {
                            bank: sel.bank,
                            index,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
