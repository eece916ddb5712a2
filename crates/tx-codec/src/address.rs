//! Address parsing and scriptPubKey rendering.
//!
//! Supports Base58Check P2PKH/P2SH and Bech32/Bech32m segwit addresses on
//! mainnet, testnet, testnet4, and signet.

use crate::base58;
use crate::bech32;
use crate::error::CodecError;

/// Default explorer API endpoint for Bitcoin mainnet.
pub const MAINNET_API: &str = "https://mempool.space/api";

/// Default explorer API endpoint for Bitcoin testnet.
pub const TESTNET_API: &str = "https://mempool.space/testnet/api";

/// Default explorer API endpoint for Bitcoin testnet4.
pub const TESTNET4_API: &str = "https://mempool.space/testnet4/api";

/// Default explorer API endpoint for Bitcoin signet.
pub const SIGNET_API: &str = "https://mempool.space/signet/api";

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Testnet4,
    Signet,
}

impl Network {
    /// Human-readable prefix for segwit addresses.
    pub fn bech32_hrp(self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet | Network::Testnet4 | Network::Signet => "tb",
        }
    }

    /// Version byte of WIF-encoded private keys.
    pub fn wif_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet | Network::Testnet4 | Network::Signet => 0xef,
        }
    }

    /// Version byte of Base58Check P2PKH addresses.
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Testnet4 | Network::Signet => 0x6f,
        }
    }

    /// Version byte of Base58Check P2SH addresses.
    pub fn p2sh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet | Network::Testnet4 | Network::Signet => 0xc4,
        }
    }

    /// Base URL of the esplora-style explorer API for this network.
    ///
    /// Raw transaction hex posted to `{base}/tx` reaches the relay; the core
    /// itself performs no HTTP.
    pub fn explorer_api(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API,
            Network::Testnet => TESTNET_API,
            Network::Testnet4 => TESTNET4_API,
            Network::Signet => SIGNET_API,
        }
    }

    /// Resolves a bech32 prefix to a network.
    ///
    /// Testnet, testnet4, and signet share the `tb` prefix; `tb` resolves to
    /// `Testnet`.
    pub fn from_bech32_hrp(hrp: &str) -> Option<Network> {
        match hrp {
            "bc" => Some(Network::Mainnet),
            "tb" => Some(Network::Testnet),
            _ => None,
        }
    }

    /// Resolves a WIF version byte to a network.
    pub fn from_wif_prefix(prefix: u8) -> Option<Network> {
        match prefix {
            0x80 => Some(Network::Mainnet),
            0xef => Some(Network::Testnet),
            _ => None,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Testnet4 => write!(f, "testnet4"),
            Network::Signet => write!(f, "signet"),
        }
    }
}

/// A parsed Bitcoin address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Legacy pay-to-public-key-hash.
    P2pkh { network: Network, hash: [u8; 20] },
    /// Legacy pay-to-script-hash.
    P2sh { network: Network, hash: [u8; 20] },
    /// Native segwit: witness version plus program.
    Segwit {
        network: Network,
        version: u8,
        program: Vec<u8>,
    },
}

impl Address {
    /// Builds the segwit-v0 address for a 20-byte public key hash.
    pub fn p2wpkh(pubkey_hash: [u8; 20], network: Network) -> Address {
        Address::Segwit {
            network,
            version: 0,
            program: pubkey_hash.to_vec(),
        }
    }

    /// Parses an address in either Base58Check or bech32 form.
    pub fn parse(s: &str) -> Result<Address, CodecError> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("bc1") || lower.starts_with("tb1") {
            let (hrp, version, program) = bech32::decode(s)?;
            let network = Network::from_bech32_hrp(&hrp).ok_or_else(|| {
                CodecError::InvalidEncoding(format!("unknown address prefix {hrp:?}"))
            })?;
            return Ok(Address::Segwit {
                network,
                version,
                program,
            });
        }

        let payload = base58::check_decode(s)?;
        if payload.len() != 21 {
            return Err(CodecError::InvalidEncoding(format!(
                "legacy address payload is {} bytes, expected 21",
                payload.len()
            )));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);

        match payload[0] {
            0x00 => Ok(Address::P2pkh {
                network: Network::Mainnet,
                hash,
            }),
            0x6f => Ok(Address::P2pkh {
                network: Network::Testnet,
                hash,
            }),
            0x05 => Ok(Address::P2sh {
                network: Network::Mainnet,
                hash,
            }),
            0xc4 => Ok(Address::P2sh {
                network: Network::Testnet,
                hash,
            }),
            version => Err(CodecError::InvalidEncoding(format!(
                "unknown address version byte {version:#04x}"
            ))),
        }
    }

    /// Network the address belongs to.
    pub fn network(&self) -> Network {
        match self {
            Address::P2pkh { network, .. }
            | Address::P2sh { network, .. }
            | Address::Segwit { network, .. } => *network,
        }
    }

    /// Renders the locking script for this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self {
            Address::P2pkh { hash, .. } => {
                // OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
                let mut script = Vec::with_capacity(25);
                script.extend_from_slice(&[0x76, 0xa9, 0x14]);
                script.extend_from_slice(hash);
                script.extend_from_slice(&[0x88, 0xac]);
                script
            }
            Address::P2sh { hash, .. } => {
                // OP_HASH160 <20> OP_EQUAL
                let mut script = Vec::with_capacity(23);
                script.extend_from_slice(&[0xa9, 0x14]);
                script.extend_from_slice(hash);
                script.push(0x87);
                script
            }
            Address::Segwit {
                version, program, ..
            } => {
                // OP_0 or OP_1..OP_16, then the pushed program.
                let op = if *version == 0 { 0x00 } else { 0x50 + version };
                let mut script = Vec::with_capacity(2 + program.len());
                script.push(op);
                script.push(program.len() as u8);
                script.extend_from_slice(program);
                script
            }
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::P2pkh { network, hash } => {
                let mut payload = vec![network.p2pkh_version()];
                payload.extend_from_slice(hash);
                write!(f, "{}", base58::check_encode(&payload))
            }
            Address::P2sh { network, hash } => {
                let mut payload = vec![network.p2sh_version()];
                payload.extend_from_slice(hash);
                write!(f, "{}", base58::check_encode(&payload))
            }
            Address::Segwit {
                network,
                version,
                program,
            } => {
                let encoded = bech32::encode(network.bech32_hrp(), *version, program)
                    .map_err(|_| std::fmt::Error)?;
                write!(f, "{encoded}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V0_MAINNET: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    #[test]
    fn parses_v0_mainnet_address() {
        let addr = Address::parse(V0_MAINNET).unwrap();
        assert_eq!(addr.network(), Network::Mainnet);
        assert_eq!(
            hex::encode(addr.script_pubkey()),
            "0014751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn testnet_p2wpkh_script_pubkey() {
        // Deployment wallet address and its published locking script.
        let addr = Address::parse("tb1qr25l2p34sv4wnz4q0cuh4g9jd9qh2eua6y5awq").unwrap();
        assert_eq!(addr.network(), Network::Testnet);
        assert_eq!(
            hex::encode(addr.script_pubkey()),
            "00141aa9f50635832ae98aa07e397aa0b2694175679d"
        );
    }

    #[test]
    fn second_testnet_address_script_pubkey() {
        let addr = Address::parse("tb1qrk6da5g0592sx6lmgpchaf5qy2lgn8am7cuf3a").unwrap();
        assert_eq!(
            hex::encode(addr.script_pubkey()),
            "00141db4ded10fa155036bfb40717ea68022be899fbb"
        );
    }

    #[test]
    fn display_reencodes_segwit() {
        let addr = Address::parse(V0_MAINNET).unwrap();
        assert_eq!(addr.to_string(), V0_MAINNET);
    }

    #[test]
    fn p2wpkh_constructor_matches_parse() {
        let hash: [u8; 20] = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6")
            .unwrap()
            .try_into()
            .unwrap();
        let addr = Address::p2wpkh(hash, Network::Mainnet);
        assert_eq!(addr.to_string(), V0_MAINNET);
    }

    #[test]
    fn parses_legacy_p2pkh() {
        let addr = Address::parse("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
        assert_eq!(addr.network(), Network::Mainnet);
        let script = addr.script_pubkey();
        assert_eq!(script.len(), 25);
        assert_eq!(&script[..3], &[0x76, 0xa9, 0x14]);
        assert_eq!(&script[23..], &[0x88, 0xac]);
        assert_eq!(addr.to_string(), "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
    }

    #[test]
    fn legacy_roundtrip_testnet_and_p2sh() {
        for addr in [
            Address::P2pkh {
                network: Network::Testnet,
                hash: [0x42; 20],
            },
            Address::P2sh {
                network: Network::Mainnet,
                hash: [0x17; 20],
            },
        ] {
            assert_eq!(Address::parse(&addr.to_string()).unwrap(), addr);
        }
    }

    #[test]
    fn taproot_script_pubkey_uses_op_1() {
        let addr = Address::Segwit {
            network: Network::Mainnet,
            version: 1,
            program: vec![0x33; 32],
        };
        let script = addr.script_pubkey();
        assert_eq!(script[0], 0x51);
        assert_eq!(script[1], 32);
        assert_eq!(script.len(), 34);
    }

    #[test]
    fn taproot_address_roundtrip() {
        let addr = Address::Segwit {
            network: Network::Testnet,
            version: 1,
            program: vec![0x9a; 32],
        };
        let encoded = addr.to_string();
        assert!(encoded.starts_with("tb1p"));
        assert_eq!(Address::parse(&encoded).unwrap(), addr);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Address::parse("notanaddress!!!").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn rejects_unknown_version_byte() {
        // Version 0x30 is not a known legacy prefix.
        let mut payload = vec![0x30];
        payload.extend_from_slice(&[0u8; 20]);
        let s = crate::base58::check_encode(&payload);
        assert!(matches!(
            Address::parse(&s).unwrap_err(),
            CodecError::InvalidEncoding(_)
        ));
    }

    #[test]
    fn network_parameters() {
        assert_eq!(Network::Mainnet.bech32_hrp(), "bc");
        assert_eq!(Network::Testnet4.bech32_hrp(), "tb");
        assert_eq!(Network::Mainnet.wif_prefix(), 0x80);
        assert_eq!(Network::Signet.wif_prefix(), 0xef);
        assert_eq!(Network::from_bech32_hrp("bc"), Some(Network::Mainnet));
        assert_eq!(Network::from_bech32_hrp("xyz"), None);
    }

    #[test]
    fn explorer_api_urls_are_nonempty() {
        for network in [
            Network::Mainnet,
            Network::Testnet,
            Network::Testnet4,
            Network::Signet,
        ] {
            assert!(network.explorer_api().starts_with("https://"));
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::Testnet4.to_string(), "testnet4");
    }
}
