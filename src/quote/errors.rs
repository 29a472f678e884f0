// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

/// Decode errors for marshalled TPM structures.  Offsets are byte positions
/// into the buffer handed to the decoder.
#[derive(thiserror::Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("bad magic at offset {offset}: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        offset: usize,
        expected: u32,
        found: u32,
    },
    #[error("not a quote: attest tag at offset {offset} is {found:#06x}, expected {expected:#06x}")]
    BadTag {
        offset: usize,
        expected: u16,
        found: u16,
    },
    #[error("truncated structure at offset {offset}: need {need} bytes, {left} left")]
    Truncated {
        offset: usize,
        need: usize,
        left: usize,
    },
    #[error("{0} trailing bytes after the attested structure")]
    TrailingBytes(usize),
    #[error("unknown PCR bank algorithm {found:#06x} at offset {offset}")]
    UnknownBankAlg { offset: usize, found: u16 },
    #[error("Semantic error: {0}")]
    Sema(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
