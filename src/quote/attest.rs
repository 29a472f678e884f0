// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use super::common::HashAlg;
use super::errors::Error;

/// TPM_GENERATED_VALUE, the fixed magic opening every TPM-generated
/// attestation structure
pub(crate) const TPM_GENERATED_VALUE: u32 = 0xff54_4347;

/// TPM_ST_ATTEST_QUOTE, the structure tag of a quote (as opposed to e.g.
/// certify or creation attestations)
pub(crate) const TPM_ST_ATTEST_QUOTE: u16 = 0x8018;

/// TPMS_CLOCK_INFO
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClockInfo {
    /// milliseconds the TPM has been powered since the last clock write
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    /// whether `clock` is guaranteed not to roll backwards
    pub safe: bool,
}

/// One TPMS_PCR_SELECTION entry: a bank and the bitmap of the registers
/// selected within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcrSelection {
    pub bank: HashAlg,
    bitmap: Vec<u8>,
}

impl PcrSelection {
    pub(crate) fn new(bank: HashAlg, bitmap: Vec<u8>) -> Self {
        Self { bank, bitmap }
    }

    /// Whether PCR `index` is selected.  Bit `j` of bitmap byte `i` stands
    /// for register `8*i + j`; the bitmap width is whatever the structure's
    /// size-of-select field declared.
    pub fn is_selected(&self, index: u8) -> bool {
        let byte = usize::from(index) / 8;
        let bit = index % 8;

        match self.bitmap.get(byte) {
            Some(b) => b & (1 << bit) != 0,
            None => false,
        }
    }

    /// Selected register indices, ascending
    pub fn indices(&self) -> Vec<u8> {
        let mut v = Vec::new();

        for (i, b) in self.bitmap.iter().enumerate() {
            for j in 0..8u8 {
                if b & (1 << j) != 0 {
                    v.push((i * 8) as u8 + j);
                }
            }
        }

        v
    }
}

/// Decoded view of a marshalled TPMS_ATTEST quote structure.  See §10.12.12
/// of TPM 2.0 Library Part 2 for syntax and semantics of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attest {
    /// Qualified name of the signing key (TPM2B_NAME)
    pub qualified_signer: Vec<u8>,
    /// Caller-supplied qualifying data; carries the challenge nonce
    pub extra_data: Vec<u8>,
    pub clock_info: ClockInfo,
    pub firmware_version: u64,
    /// The banks and registers the quote ranges over, in selection order
    pub pcr_selections: Vec<PcrSelection>,
    /// Composite digest over the selected register values
    pub pcr_digest: Vec<u8>,
}

impl Attest {
    /// Decode a marshalled TPMS_ATTEST quote.  The grammar is fixed and the
    /// parse is strict: every length prefix must fit the remaining buffer
    /// and no bytes may trail the last field.
    pub fn decode(buf: &[u8]) -> Result<Attest, Error> {
        let mut r = Reader::new(buf);

        let magic_offset = r.offset();
        let magic = r.u32()?;
        if magic != TPM_GENERATED_VALUE {
            return Err(Error::BadMagic {
                offset: magic_offset,
                expected: TPM_GENERATED_VALUE,
                found: magic,
            });
        }

        let tag_offset = r.offset();
        let tag = r.u16()?;
        if tag != TPM_ST_ATTEST_QUOTE {
            return Err(Error::BadTag {
                offset: tag_offset,
                expected: TPM_ST_ATTEST_QUOTE,
                found: tag,
            });
        }

        let qualified_signer = r.sized_bytes()?.to_vec();
        let extra_data = r.sized_bytes()?.to_vec();

        let clock_info = ClockInfo {
            clock: r.u64()?,
            reset_count: r.u32()?,
            restart_count: r.u32()?,
            safe: match r.u8()? {
                0 => false,
                1 => true,
                x => return Err(Error::Sema(format!("clock-info safe flag is {x}, expecting 0 or 1"))),
            },
        };

        let firmware_version = r.u64()?;

        let count = r.u32()?;
        let mut pcr_selections = Vec::new();
        for _ in 0..count {
            let alg_offset = r.offset();
            let alg_id = r.u16()?;
            let bank = HashAlg::from_alg_id(alg_id).ok_or(Error::UnknownBankAlg {
                offset: alg_offset,
                found: alg_id,
            })?;

            let sizeof_select = r.u8()?;
            let bitmap = r.bytes(usize::from(sizeof_select))?.to_vec();

            pcr_selections.push(PcrSelection::new(bank, bitmap));
        }

        let pcr_digest = r.sized_bytes()?.to_vec();

        if r.left() != 0 {
            return Err(Error::TrailingBytes(r.left()));
        }

        Ok(Attest {
            qualified_signer,
            extra_data,
            clock_info,
            firmware_version,
            pcr_selections,
            pcr_digest,
        })
    }

    /// Whether PCR `index` of `bank` is covered by the quote's selection
    pub fn selects(&self, bank: HashAlg, index: u8) -> bool {
        self.pcr_selections
            .iter()
            .any(|s| s.bank == bank && s.is_selected(index))
    }
}

/// Big-endian cursor over a marshalled TPM structure, tracking the offset
/// for error reporting
struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn left(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.left() < n {
            return Err(Error::Truncated {
                offset: self.offset,
                need: n,
                left: self.left(),
            });
        }

        let b = &self.buf[self.offset..self.offset + n];
        self.offset += n;

        Ok(b)
    }

    fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, Error> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, Error> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, Error> {
        let b = self.bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// A TPM2B field: u16 size prefix followed by that many bytes
    fn sized_bytes(&mut self) -> Result<&'a [u8], Error> {
        let n = self.u16()?;
        self.bytes(usize::from(n))
    }
}


#[cfg(test)]
mod tests {
    use super::testenc::{bitmap, QuoteEncoder};
    use super::*;
    use hex_literal::hex;

    fn sample() -> QuoteEncoder {
        let mut q = QuoteEncoder::new();
        q.extra_data = b"ab12".to_vec();
        q.selections = vec![(HashAlg::Sha256, bitmap(&[0, 7, 10], 3))];
        q.pcr_digest = hex!("66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925").to_vec();
        q
    }

    #[test]
    fn decode_round_trip() {
        let q = sample();
        let a = Attest::decode(&q.encode()).unwrap();

        assert_eq!(a.qualified_signer, q.signer);
        assert_eq!(a.extra_data, b"ab12");
        assert_eq!(a.clock_info.clock, 1_234_567);
        assert_eq!(a.clock_info.reset_count, 3);
        assert_eq!(a.clock_info.restart_count, 1);
        assert!(a.clock_info.safe);
        assert_eq!(a.firmware_version, 0x2020_0312_0001_0000);
        assert_eq!(a.pcr_digest, q.pcr_digest);

        assert_eq!(a.pcr_selections.len(), 1);
        let sel = &a.pcr_selections[0];
        assert_eq!(sel.bank, HashAlg::Sha256);
        assert_eq!(sel.indices(), vec![0, 7, 10]);
        assert!(sel.is_selected(7));
        assert!(!sel.is_selected(1));
        assert!(!sel.is_selected(200));

        assert!(a.selects(HashAlg::Sha256, 10));
        assert!(!a.selects(HashAlg::Sha1, 10));
    }

    #[test]
    fn decode_bad_magic() {
        let mut buf = sample().encode();
        buf[0] = 0x00;

        let e = Attest::decode(&buf).unwrap_err();
        assert_eq!(
            e,
            Error::BadMagic {
                offset: 0,
                expected: TPM_GENERATED_VALUE,
                found: 0x0054_4347,
            }
        );
    }

    #[test]
    fn decode_rejects_certify_tag() {
        let mut buf = sample().encode();
        // TPM_ST_ATTEST_CERTIFY
        buf[4..6].copy_from_slice(&0x8014u16.to_be_bytes());

        let e = Attest::decode(&buf).unwrap_err();
        assert_eq!(
            e,
            Error::BadTag {
                offset: 4,
                expected: TPM_ST_ATTEST_QUOTE,
                found: 0x8014,
            }
        );
    }

    #[test]
    fn decode_rejects_overlong_length_prefix() {
        let mut q = sample();
        q.signer = vec![0xaa; 16];
        let mut buf = q.encode();

        // inflate the qualified-signer size prefix beyond the buffer
        buf[6..8].copy_from_slice(&0xffffu16.to_be_bytes());

        match Attest::decode(&buf).unwrap_err() {
            Error::Truncated { offset, need, .. } => {
                assert_eq!(offset, 8);
                assert_eq!(need, 0xffff);
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut buf = sample().encode();
        buf.push(0x00);

        assert_eq!(Attest::decode(&buf).unwrap_err(), Error::TrailingBytes(1));
    }

    #[test]
    fn decode_rejects_truncation_anywhere() {
        let buf = sample().encode();

        for n in 0..buf.len() {
            assert!(Attest::decode(&buf[..n]).is_err(), "accepted {n}-byte prefix");
        }
    }

    #[test]
    fn decode_rejects_unknown_bank() {
        let mut q = sample();
        q.selections = vec![(HashAlg::Sha1, bitmap(&[0], 3))];
        let mut buf = q.encode();

        // clobber the selection's TPM_ALG_ID (it sits 4 bytes after the
        // selection count, which follows the 8-byte firmware version)
        let alg_off = buf.len() - q.pcr_digest.len() - 2 - 3 - 1 - 2;
        buf[alg_off..alg_off + 2].copy_from_slice(&0x0010u16.to_be_bytes());

        match Attest::decode(&buf).unwrap_err() {
            Error::UnknownBankAlg { found, .. } => assert_eq!(found, 0x0010),
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn decode_rejects_bad_safe_flag() {
        let mut q = sample();
        q.clock_info.safe = true;
        let mut buf = q.encode();

        // safe flag sits right after clock (8) + resetCount (4) +
        // restartCount (4), which follow the two sized fields
        let safe_off = 4 + 2 + 2 + q.signer.len() + 2 + q.extra_data.len() + 16;
        buf[safe_off] = 2;

        assert!(matches!(Attest::decode(&buf).unwrap_err(), Error::Sema(_)));
    }

    #[test]
    fn bitmap_width_follows_size_of_select() {
        // a 2-byte select must still address registers 0..=15
        let mut q = sample();
        q.selections = vec![(HashAlg::Sha256, bitmap(&[1, 15], 2))];

        let a = Attest::decode(&q.encode()).unwrap();
        assert_eq!(a.pcr_selections[0].indices(), vec![1, 15]);
        assert!(!a.selects(HashAlg::Sha256, 16));
    }

    #[test]
    fn decode_multiple_banks_in_order() {
        let mut q = sample();
        q.selections = vec![
            (HashAlg::Sha1, bitmap(&[0], 3)),
            (HashAlg::Sha256, bitmap(&[0, 1], 3)),
        ];

        let a = Attest::decode(&q.encode()).unwrap();
        assert_eq!(a.pcr_selections.len(), 2);
        assert_eq!(a.pcr_selections[0].bank, HashAlg::Sha1);
        assert_eq!(a.pcr_selections[1].bank, HashAlg::Sha256);
    }

    #[test]
    fn decode_empty_buffer() {
        match Attest::decode(&[]).unwrap_err() {
            Error::Truncated { offset, need, left } => {
                assert_eq!((offset, need, left), (0, 4, 0));
            }
            e => panic!("unexpected error: {e}"),
        }
    }
}
