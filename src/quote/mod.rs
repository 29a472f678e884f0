// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

//! The quote module provides an [`Evidence`] object to encapsulate business
//! logics and associated state used for verification and appraisal of a TPM
//! 2.0 attestation quote.
//!
//! # Example
//!
//! The following example assumes that the attestation key store (`aks`) and
//! the PCR baseline (`baseline`) have already been initialised, that
//! `message` and `signature` contain the raw quote artifacts produced by
//! `TPM2_Quote`, and that `pcrs` holds the register values reported next to
//! the quote.
//!
//! ```no_run
//! use tpmquote::quote::Evidence;
//! use tpmquote::store::{IKeyStore, MemoKeyStore, PcrValues};
//!
//! let jks = std::fs::read_to_string("akstore.json").unwrap();
//! let mut aks = MemoKeyStore::new();
//! aks.load_json(&jks).expect("loading attestation keys");
//!
//! let jbl = std::fs::read_to_string("pcr_values.json").unwrap();
//! let baseline = PcrValues::parse(&jbl).expect("loading PCR baseline");
//!
//! let message = std::fs::read("quote_message.dat").unwrap();
//! let signature = std::fs::read("quote_signature.dat").unwrap();
//! let jpcr = std::fs::read_to_string("pcrs.json").unwrap();
//! let pcrs = PcrValues::parse(&jpcr).expect("loading reported PCRs");
//!
//! let ak = aks.lookup("default").expect("unknown key-id");
//! let nonce = b"challenge bytes";
//!
//! let e = Evidence::new(message, signature, pcrs);
//!
//! // decode the quote, verify the AK signature over the raw message
//! // bytes, check nonce freshness, then appraise the PCR state against
//! // the baseline
//! let verdict = e.appraise(&ak, nonce, &baseline, false);
//!
//! assert!(verdict.is_accepted());
//! ```

pub use self::attest::Attest;
pub use self::attest::ClockInfo;
pub use self::attest::PcrSelection;
pub use self::common::HashAlg;
pub use self::errors::Error;
pub use self::evidence::Evidence;
pub use self::evidence::RejectReason;
pub use self::evidence::Verdict;

mod attest;
mod common;
mod errors;
mod evidence;
