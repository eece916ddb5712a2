//! Bech32 and Bech32m encoding for segwit addresses.
//!
//! The checksum constant is selected from the witness version: 1 for
//! version 0 (BIP173) and 0x2bc830a3 for versions 1..=16 (BIP350). Strings
//! are produced lowercase; decoding accepts either case but never a mixture.

use crate::error::CodecError;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc830a3;

const CHECKSUM_LEN: usize = 6;

/// Maximum witness program length in bytes (BIP141).
pub const MAX_PROGRAM_LEN: usize = 40;

/// Minimum witness program length in bytes (BIP141).
pub const MIN_PROGRAM_LEN: usize = 2;

/// Checksum flavor, determined by the witness version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Bech32,
    Bech32m,
}

impl Variant {
    /// Selects the variant mandated for `witness_version`.
    pub fn for_witness_version(witness_version: u8) -> Variant {
        if witness_version == 0 {
            Variant::Bech32
        } else {
            Variant::Bech32m
        }
    }

    fn checksum_const(self) -> u32 {
        match self {
            Variant::Bech32 => BECH32_CONST,
            Variant::Bech32m => BECH32M_CONST,
        }
    }
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ value as u32;
        for (i, &gen) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= gen;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(hrp.len() * 2 + 1);
    out.extend(hrp.bytes().map(|b| b >> 5));
    out.push(0);
    out.extend(hrp.bytes().map(|b| b & 31));
    out
}

fn create_checksum(hrp: &str, data: &[u8], variant: Variant) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; CHECKSUM_LEN]);
    let pm = polymod(&values) ^ variant.checksum_const();

    let mut checksum = [0u8; CHECKSUM_LEN];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((pm >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

/// Regroups `data` from `from_bits`-wide values into `to_bits`-wide values.
///
/// With `pad`, a final partial group is zero-padded. Without it, leftover
/// bits must be zero padding of less than one input group, otherwise the
/// encoding is non-canonical and rejected.
pub fn convert_bits(
    data: &[u8],
    from_bits: u32,
    to_bits: u32,
    pad: bool,
) -> Result<Vec<u8>, CodecError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv: u32 = (1 << to_bits) - 1;
    let mut out = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);

    for &value in data {
        if u32::from(value) >> from_bits != 0 {
            return Err(CodecError::InvalidEncoding(format!(
                "value {value} exceeds {from_bits} bits"
            )));
        }
        acc = (acc << from_bits) | u32::from(value);
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return Err(CodecError::InvalidEncoding(
            "non-canonical padding in bit-group conversion".into(),
        ));
    }

    Ok(out)
}

fn validate_hrp(hrp: &str) -> Result<(), CodecError> {
    if hrp.is_empty() || hrp.len() > 83 {
        return Err(CodecError::InvalidEncoding(format!(
            "human-readable prefix length {} out of range",
            hrp.len()
        )));
    }
    if let Some(c) = hrp.chars().find(|&c| !('\x21'..='\x7e').contains(&c)) {
        return Err(CodecError::InvalidEncoding(format!(
            "human-readable prefix contains {c:?}"
        )));
    }
    Ok(())
}

/// Encodes a witness version and program as a segwit address string.
pub fn encode(hrp: &str, witness_version: u8, program: &[u8]) -> Result<String, CodecError> {
    validate_hrp(hrp)?;
    if witness_version > 16 {
        return Err(CodecError::InvalidEncoding(format!(
            "witness version {witness_version} out of range"
        )));
    }
    if program.len() < MIN_PROGRAM_LEN || program.len() > MAX_PROGRAM_LEN {
        return Err(CodecError::InvalidEncoding(format!(
            "witness program length {} out of range",
            program.len()
        )));
    }

    let mut data = vec![witness_version];
    data.extend(convert_bits(program, 8, 5, true)?);

    let variant = Variant::for_witness_version(witness_version);
    let checksum = create_checksum(hrp, &data, variant);
    data.extend_from_slice(&checksum);

    let mut out = String::with_capacity(hrp.len() + 1 + data.len());
    out.push_str(hrp);
    out.push('1');
    for value in data {
        out.push(CHARSET[value as usize] as char);
    }
    Ok(out)
}

/// Decodes a segwit address string into (hrp, witness version, program).
pub fn decode(s: &str) -> Result<(String, u8, Vec<u8>), CodecError> {
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(CodecError::InvalidEncoding("mixed-case bech32 string".into()));
    }
    let s = s.to_ascii_lowercase();

    let sep = s.rfind('1').ok_or_else(|| {
        CodecError::InvalidEncoding("missing bech32 separator".into())
    })?;
    let (hrp, rest) = (&s[..sep], &s[sep + 1..]);
    validate_hrp(hrp)?;
    if rest.len() < CHECKSUM_LEN + 1 {
        return Err(CodecError::InvalidEncoding(format!(
            "bech32 data part too short: {} characters",
            rest.len()
        )));
    }

    let mut data = Vec::with_capacity(rest.len());
    for c in rest.chars() {
        let value = CHARSET
            .iter()
            .position(|&a| a as char == c)
            .ok_or_else(|| {
                CodecError::InvalidEncoding(format!("invalid bech32 character {c:?}"))
            })?;
        data.push(value as u8);
    }

    let witness_version = data[0];
    if witness_version > 16 {
        return Err(CodecError::InvalidEncoding(format!(
            "witness version {witness_version} out of range"
        )));
    }

    // The witness version dictates which checksum constant must verify.
    let variant = Variant::for_witness_version(witness_version);
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    if polymod(&values) != variant.checksum_const() {
        let body = &data[..data.len() - CHECKSUM_LEN];
        let expected = create_checksum(hrp, body, variant)
            .iter()
            .map(|&v| CHARSET[v as usize] as char)
            .collect::<String>();
        return Err(CodecError::ChecksumMismatch {
            expected,
            found: rest[rest.len() - CHECKSUM_LEN..].to_string(),
        });
    }

    let program = convert_bits(&data[1..data.len() - CHECKSUM_LEN], 5, 8, false)?;
    if program.len() < MIN_PROGRAM_LEN || program.len() > MAX_PROGRAM_LEN {
        return Err(CodecError::InvalidEncoding(format!(
            "witness program length {} out of range",
            program.len()
        )));
    }

    Ok((hrp.to_string(), witness_version, program))
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP173 example: P2WPKH over hash160 of the generator-point pubkey.
    const V0_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
    const V0_PROGRAM: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    #[test]
    fn encodes_v0_vector() {
        let program = hex::decode(V0_PROGRAM).unwrap();
        assert_eq!(encode("bc", 0, &program).unwrap(), V0_ADDRESS);
    }

    #[test]
    fn decodes_v0_vector() {
        let (hrp, version, program) = decode(V0_ADDRESS).unwrap();
        assert_eq!(hrp, "bc");
        assert_eq!(version, 0);
        assert_eq!(hex::encode(program), V0_PROGRAM);
    }

    #[test]
    fn decodes_uppercase_form() {
        let (hrp, version, program) = decode(&V0_ADDRESS.to_uppercase()).unwrap();
        assert_eq!(hrp, "bc");
        assert_eq!(version, 0);
        assert_eq!(hex::encode(program), V0_PROGRAM);
    }

    #[test]
    fn rejects_mixed_case() {
        let mut s = V0_ADDRESS.to_string();
        s.replace_range(0..1, "B");
        assert!(matches!(
            decode(&s).unwrap_err(),
            CodecError::InvalidEncoding(_)
        ));
    }

    #[test]
    fn bech32m_roundtrip_v1() {
        let program = [0xab; 32];
        let encoded = encode("bc", 1, &program).unwrap();
        assert!(encoded.starts_with("bc1p"));
        let (hrp, version, decoded) = decode(&encoded).unwrap();
        assert_eq!((hrp.as_str(), version), ("bc", 1));
        assert_eq!(decoded, program);
    }

    #[test]
    fn roundtrip_all_versions() {
        for version in 0..=16u8 {
            let program = vec![version; 20];
            let encoded = encode("tb", version, &program).unwrap();
            let (hrp, got_version, got_program) = decode(&encoded).unwrap();
            assert_eq!(hrp, "tb");
            assert_eq!(got_version, version);
            assert_eq!(got_program, program);
        }
    }

    #[test]
    fn single_character_mutation_fails_checksum() {
        let encoded = encode("tb", 0, &[0x11; 20]).unwrap();
        let bytes = encoded.as_bytes();
        for i in 3..encoded.len() {
            let original = bytes[i];
            let replacement = if original == b'q' { b'p' } else { b'q' };
            let mut mutated = bytes.to_vec();
            mutated[i] = replacement;
            let mutated = String::from_utf8(mutated).unwrap();
            assert!(
                decode(&mutated).is_err(),
                "mutation at {i} was not detected"
            );
        }
    }

    #[test]
    fn wrong_constant_for_version_is_checksum_mismatch() {
        // Hand-build a version-1 string using the bech32 (version-0) constant.
        let program = [0x22; 32];
        let mut data = vec![1u8];
        data.extend(convert_bits(&program, 8, 5, true).unwrap());
        let checksum = create_checksum("bc", &data, Variant::Bech32);
        data.extend_from_slice(&checksum);
        let mut s = String::from("bc1");
        for value in data {
            s.push(CHARSET[value as usize] as char);
        }

        assert!(matches!(
            decode(&s).unwrap_err(),
            CodecError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn convert_bits_roundtrip() {
        for data in [vec![], vec![0u8], vec![0xff; 20], (0u8..=255).collect()] {
            let grouped = convert_bits(&data, 8, 5, true).unwrap();
            assert!(grouped.iter().all(|&v| v < 32));
            assert_eq!(convert_bits(&grouped, 5, 8, false).unwrap(), data);
        }
    }

    #[test]
    fn convert_bits_rejects_nonzero_padding() {
        // 20 bytes regroup into 32 five-bit values; flip the padding bits.
        let mut grouped = convert_bits(&[0x55; 20], 8, 5, true).unwrap();
        let last = grouped.len() - 1;
        grouped[last] |= 0x0f;
        assert!(convert_bits(&grouped, 5, 8, false).is_err());
    }

    #[test]
    fn convert_bits_rejects_oversized_values() {
        assert!(convert_bits(&[32], 5, 8, true).is_err());
    }

    #[test]
    fn encode_rejects_bad_inputs() {
        assert!(encode("bc", 17, &[0; 20]).is_err());
        assert!(encode("bc", 0, &[0; 1]).is_err());
        assert!(encode("bc", 0, &[0; 41]).is_err());
        assert!(encode("", 0, &[0; 20]).is_err());
    }

    #[test]
    fn decode_rejects_malformed_strings() {
        assert!(decode("bcqqqqqqqq").is_err()); // no separator
        assert!(decode("bc1").is_err()); // empty data part
        assert!(decode("bc1qqqqb").is_err()); // shorter than a checksum
    }
}
