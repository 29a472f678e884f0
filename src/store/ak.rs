// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::quote::HashAlg;
use openssl::error::ErrorStack;
use openssl::pkey::{Id, PKey, Public};
use openssl::rsa::Padding;
use openssl::sign::RsaPssSaltlen;
use openssl::sign::Verifier;
use serde::Deserialize;

/// The signature scheme an attestation key was provisioned with.  The
/// verifier honours exactly this scheme; there is no fallback, so a
/// signature made under any other scheme fails verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum SignatureScheme {
    #[serde(rename = "rsa-pss")]
    RsaPss,
    #[serde(rename = "rsa-ssa")]
    RsaSsa,
    #[serde(rename = "ecdsa")]
    EcDsa,
}

/// A device attestation key and associated metadata
#[derive(Clone, Debug, Deserialize)]
pub struct Ak {
    /// The AK public key wrapped in a Subject Public Key Info and serialised
    /// using the textual encoding described in §13 of RFC7468
    #[serde(rename(deserialize = "pkey"))]
    raw_pkey: String,

    #[serde(skip)]
    pkey: Option<PKey<Public>>,

    /// Identifier under which the key was enrolled; callers resolve it from
    /// request metadata
    #[serde(rename(deserialize = "key-id"))]
    pub key_id: String,

    #[serde(rename(deserialize = "signature-scheme"))]
    scheme: SignatureScheme,

    /// Hash the quote scheme was parameterised with; also the hash of the
    /// composite PCR digest
    #[serde(rename(deserialize = "hash-algorithm"))]
    hash: HashAlg,
}

impl Ak {
    /// Build an attestation key directly from PEM SPKI bytes
    pub fn from_pem(pem: &[u8], scheme: SignatureScheme, hash: HashAlg) -> Result<Self, Error> {
        let mut ak = Self {
            raw_pkey: String::from_utf8_lossy(pem).into_owned(),
            pkey: None,
            key_id: String::new(),
            scheme,
            hash,
        };

        ak.parse_pkey()?;

        Ok(ak)
    }

    /// Parse the PEM key material carried in the store entry.  A key that
    /// does not parse, or whose type contradicts the declared scheme, is a
    /// configuration error and must be fatal at load time, not surface per
    /// request.
    pub fn parse_pkey(&mut self) -> Result<(), Error> {
        let pkey = PKey::public_key_from_pem(self.raw_pkey.as_bytes())
            .map_err(|e| Error::Syntax(format!("cannot parse PEM public key: {e}")))?;

        let want = match self.scheme {
            SignatureScheme::RsaPss | SignatureScheme::RsaSsa => Id::RSA,
            SignatureScheme::EcDsa => Id::EC,
        };

        if pkey.id() != want {
            return Err(Error::Sema(format!(
                "key type {:?} does not match declared signature scheme {:?}",
                pkey.id(),
                self.scheme
            )));
        }

        self.pkey = Some(pkey);

        Ok(())
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn hash(&self) -> HashAlg {
        self.hash
    }

    /// Verify `signature` over the raw `message` bytes under the declared
    /// scheme.  Strictly boolean: malformed signatures, wrong lengths and
    /// scheme mismatches all collapse into the same `false`, so the caller
    /// cannot be turned into an oracle separating failure causes.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        self.try_verify(message, signature).unwrap_or(false)
    }

    fn try_verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, ErrorStack> {
        let pkey = match &self.pkey {
            Some(k) => k,
            None => return Ok(false),
        };

        let mut verifier = Verifier::new(self.hash.message_digest(), pkey)?;

        match self.scheme {
            SignatureScheme::RsaPss => {
                verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
                verifier.set_rsa_pss_saltlen(RsaPssSaltlen::MAXIMUM_LENGTH)?;
            }
            SignatureScheme::RsaSsa => {
                verifier.set_rsa_padding(Padding::PKCS1)?;
            }
            SignatureScheme::EcDsa => {}
        }

        verifier.update(message)?;
        verifier.verify(signature)
    }
}
