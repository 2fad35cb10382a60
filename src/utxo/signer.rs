//! P2PKH Transaction Signer
//!
//! Builds and signs the drafted transaction entirely in-process; key material
//! never leaves this module. Signing is strictly positional: the key paired
//! with the i-th funding input produces the i-th scriptSig. Curve arithmetic
//! is delegated to `secp256k1`.

use ripemd::Ripemd160;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::types::TxDraft;
use crate::config::Network;

const SIGHASH_ALL: u32 = 0x01;
const SEQUENCE_FINAL: u32 = 0xffff_ffff;
const TX_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SignError {
    /// The canonical "nothing to spend" failure: the draft has no inputs, or
    /// the build found nothing usable to sign.
    #[error("No spendable inputs.")]
    NoSpendableInputs,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Invalid destination address: {0}")]
    InvalidAddress(String),

    #[error("Invalid funding reference: {0}")]
    InvalidOutpoint(String),
}

struct PreparedInput {
    txid: [u8; 32],
    vout: u32,
    secret: SecretKey,
}

struct PreparedOutput {
    value: u64,
    script: Vec<u8>,
}

/// Sign a draft and return the hex-encoded raw transaction.
pub fn sign(draft: &TxDraft, network: Network) -> Result<String, SignError> {
    if draft.inputs.is_empty() {
        return Err(SignError::NoSpendableInputs);
    }

    let secp = Secp256k1::new();

    let inputs: Vec<PreparedInput> = draft
        .inputs
        .iter()
        .map(|input| {
            Ok(PreparedInput {
                txid: txid_to_bytes(&input.outpoint.source_id)?,
                vout: input.outpoint.source_index,
                secret: decode_wif(input.key.expose(), network)?,
            })
        })
        .collect::<Result<_, SignError>>()?;

    let outputs: Vec<PreparedOutput> = draft
        .outputs
        .iter()
        .map(|out| {
            Ok(PreparedOutput {
                value: out.value,
                script: locking_script_from_address(&out.address, network)?,
            })
        })
        .collect::<Result<_, SignError>>()?;

    // Positional signing: scriptSig for input i is derived from the key
    // paired with input i, nothing else.
    let mut script_sigs = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let pubkey = PublicKey::from_secret_key(&secp, &input.secret).serialize();
        let script_code = p2pkh_locking_script(&hash160(&pubkey));
        let digest = legacy_sighash(&inputs, &outputs, i, &script_code);
        let sig = secp.sign_ecdsa(&Message::from_digest(digest), &input.secret);
        script_sigs.push(p2pkh_unlocking_script(&der_with_sighash(&sig), &pubkey));
    }

    Ok(hex::encode(serialize_tx(&inputs, &script_sigs, &outputs)))
}

/// Decode a WIF into a secp256k1 secret key, enforcing the network prefix.
fn decode_wif(wif: &str, network: Network) -> Result<SecretKey, SignError> {
    let decoded = bs58::decode(wif.trim())
        .with_check(None)
        .into_vec()
        .map_err(|e| SignError::InvalidKey(format!("WIF decode failed: {}", e)))?;

    if decoded.is_empty() || decoded[0] != network.wif_version() {
        return Err(SignError::InvalidKey("wrong WIF network prefix".to_string()));
    }

    let key_bytes: &[u8] = if decoded.len() == 34 && decoded[33] == 0x01 {
        &decoded[1..33]
    } else if decoded.len() == 33 {
        &decoded[1..33]
    } else {
        return Err(SignError::InvalidKey(format!(
            "unexpected WIF length {}",
            decoded.len()
        )));
    };

    SecretKey::from_slice(key_bytes).map_err(|e| SignError::InvalidKey(e.to_string()))
}

/// Hash160 = RIPEMD160(SHA256(data))
fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

/// OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
fn p2pkh_locking_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(0x76);
    script.push(0xa9);
    script.push(0x14);
    script.extend_from_slice(pubkey_hash);
    script.push(0x88);
    script.push(0xac);
    script
}

fn locking_script_from_address(address: &str, network: Network) -> Result<Vec<u8>, SignError> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| SignError::InvalidAddress(format!("{}: {}", address, e)))?;
    if decoded.len() != 21 {
        return Err(SignError::InvalidAddress(format!(
            "unexpected payload length {}",
            decoded.len()
        )));
    }
    if decoded[0] != network.p2pkh_version() {
        return Err(SignError::InvalidAddress(format!(
            "wrong address version 0x{:02x}",
            decoded[0]
        )));
    }
    let mut pkh = [0u8; 20];
    pkh.copy_from_slice(&decoded[1..21]);
    Ok(p2pkh_locking_script(&pkh))
}

fn write_varint(buf: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

/// Txids are displayed big-endian; internally the bytes are reversed.
fn txid_to_bytes(txid: &str) -> Result<[u8; 32], SignError> {
    let mut bytes = hex::decode(txid)
        .map_err(|e| SignError::InvalidOutpoint(format!("{}: {}", txid, e)))?;
    if bytes.len() != 32 {
        return Err(SignError::InvalidOutpoint(format!(
            "txid must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes.reverse();
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn serialize_outputs(outputs: &[PreparedOutput]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, outputs.len() as u64);
    for out in outputs {
        buf.extend_from_slice(&out.value.to_le_bytes());
        write_varint(&mut buf, out.script.len() as u64);
        buf.extend_from_slice(&out.script);
    }
    buf
}

/// Legacy SIGHASH_ALL digest: the transaction serialized with every scriptSig
/// empty except the signed input, which carries the scriptCode.
fn legacy_sighash(
    inputs: &[PreparedInput],
    outputs: &[PreparedOutput],
    input_index: usize,
    script_code: &[u8],
) -> [u8; 32] {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&TX_VERSION.to_le_bytes());

    write_varint(&mut preimage, inputs.len() as u64);
    for (j, input) in inputs.iter().enumerate() {
        preimage.extend_from_slice(&input.txid);
        preimage.extend_from_slice(&input.vout.to_le_bytes());
        if j == input_index {
            write_varint(&mut preimage, script_code.len() as u64);
            preimage.extend_from_slice(script_code);
        } else {
            write_varint(&mut preimage, 0);
        }
        preimage.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    }

    preimage.extend_from_slice(&serialize_outputs(outputs));
    preimage.extend_from_slice(&0u32.to_le_bytes()); // locktime
    preimage.extend_from_slice(&SIGHASH_ALL.to_le_bytes());

    double_sha256(&preimage)
}

/// DER signature with the sighash byte appended.
fn der_with_sighash(sig: &secp256k1::ecdsa::Signature) -> Vec<u8> {
    let der = sig.serialize_der();
    let mut out = Vec::with_capacity(der.len() + 1);
    out.extend_from_slice(&der);
    out.push(SIGHASH_ALL as u8);
    out
}

/// scriptSig: <sig> <compressed pubkey>
fn p2pkh_unlocking_script(sig_der: &[u8], compressed_pubkey: &[u8; 33]) -> Vec<u8> {
    let mut script = Vec::with_capacity(1 + sig_der.len() + 1 + 33);
    script.push(sig_der.len() as u8);
    script.extend_from_slice(sig_der);
    script.push(33);
    script.extend_from_slice(compressed_pubkey);
    script
}

fn serialize_tx(
    inputs: &[PreparedInput],
    script_sigs: &[Vec<u8>],
    outputs: &[PreparedOutput],
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&TX_VERSION.to_le_bytes());

    write_varint(&mut buf, inputs.len() as u64);
    for (input, script_sig) in inputs.iter().zip(script_sigs) {
        buf.extend_from_slice(&input.txid);
        buf.extend_from_slice(&input.vout.to_le_bytes());
        write_varint(&mut buf, script_sig.len() as u64);
        buf.extend_from_slice(script_sig);
        buf.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    }

    buf.extend_from_slice(&serialize_outputs(outputs));
    buf.extend_from_slice(&0u32.to_le_bytes()); // locktime
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::types::{DraftOutput, FundingInput, OutpointRef, SigningKey};

    const NET: Network = Network::Testnet;

    fn test_wif(seed: u8) -> String {
        let mut payload = vec![NET.wif_version()];
        payload.extend_from_slice(&[seed; 32]);
        payload.push(0x01); // compressed flag
        bs58::encode(payload).with_check().into_string()
    }

    fn test_address(seed: u8) -> String {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        let pubkey = PublicKey::from_secret_key(&secp, &sk).serialize();
        let mut payload = vec![NET.p2pkh_version()];
        payload.extend_from_slice(&hash160(&pubkey));
        bs58::encode(payload).with_check().into_string()
    }

    fn funding_input(txid_byte: u8, vout: u32, key_seed: u8) -> FundingInput {
        FundingInput {
            outpoint: OutpointRef {
                source_id: hex::encode([txid_byte; 32]),
                source_index: vout,
            },
            key: SigningKey::new(test_wif(key_seed)),
        }
    }

    fn draft(inputs: Vec<FundingInput>, outputs: Vec<DraftOutput>) -> TxDraft {
        TxDraft { inputs, outputs }
    }

    fn out(seed: u8, value: u64) -> DraftOutput {
        DraftOutput {
            address: test_address(seed),
            value,
        }
    }

    /// Parse the scriptSig of input `i` out of a serialized single-or-multi
    /// input transaction. Returns (der_signature, compressed_pubkey).
    fn extract_script_sig(tx: &[u8], input_index: usize) -> (Vec<u8>, [u8; 33]) {
        let mut offset = 4; // version
        let n_in = tx[offset] as usize;
        offset += 1;
        assert!(input_index < n_in);

        for i in 0..=input_index {
            offset += 32 + 4; // outpoint
            let script_len = tx[offset] as usize;
            offset += 1;
            if i == input_index {
                let script = &tx[offset..offset + script_len];
                let sig_push = script[0] as usize;
                let der = script[1..sig_push].to_vec(); // strip trailing sighash byte
                let mut pubkey = [0u8; 33];
                pubkey.copy_from_slice(&script[sig_push + 2..sig_push + 2 + 33]);
                return (der, pubkey);
            }
            offset += script_len + 4; // script + sequence
        }
        unreachable!()
    }

    #[test]
    fn test_empty_draft_is_no_spendable_inputs() {
        let result = sign(&draft(vec![], vec![out(9, 1000)]), NET);
        assert!(matches!(result, Err(SignError::NoSpendableInputs)));
    }

    #[test]
    fn test_single_input_signature_verifies() {
        let d = draft(vec![funding_input(0xaa, 0, 1)], vec![out(9, 50_000)]);
        let hex_tx = sign(&d, NET).unwrap();
        let tx = hex::decode(&hex_tx).unwrap();

        let (der, pubkey_bytes) = extract_script_sig(&tx, 0);

        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[1u8; 32]).unwrap();
        let pubkey = PublicKey::from_secret_key(&secp, &sk);
        assert_eq!(pubkey.serialize(), pubkey_bytes);

        // Recompute the digest the signer must have produced.
        let inputs = vec![PreparedInput {
            txid: txid_to_bytes(&d.inputs[0].outpoint.source_id).unwrap(),
            vout: 0,
            secret: sk,
        }];
        let outputs: Vec<PreparedOutput> = d
            .outputs
            .iter()
            .map(|o| PreparedOutput {
                value: o.value,
                script: locking_script_from_address(&o.address, NET).unwrap(),
            })
            .collect();
        let script_code = p2pkh_locking_script(&hash160(&pubkey.serialize()));
        let digest = legacy_sighash(&inputs, &outputs, 0, &script_code);

        let sig = secp256k1::ecdsa::Signature::from_der(&der).unwrap();
        assert!(
            secp.verify_ecdsa(&Message::from_digest(digest), &sig, &pubkey)
                .is_ok()
        );
    }

    #[test]
    fn test_ith_key_signs_ith_input() {
        let d = draft(
            vec![funding_input(0xaa, 0, 1), funding_input(0xbb, 1, 2)],
            vec![out(9, 70_000)],
        );
        let tx = hex::decode(sign(&d, NET).unwrap()).unwrap();

        let secp = Secp256k1::new();
        let pk1 = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[1u8; 32]).unwrap());
        let pk2 = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[2u8; 32]).unwrap());

        let (_, pubkey0) = extract_script_sig(&tx, 0);
        let (_, pubkey1) = extract_script_sig(&tx, 1);
        assert_eq!(pubkey0, pk1.serialize());
        assert_eq!(pubkey1, pk2.serialize());
    }

    #[test]
    fn test_swapped_keys_produce_mismatched_signatures() {
        // Same outpoints, keys exchanged between positions: the signature at
        // position 0 must no longer verify against key 1's digest.
        let straight = draft(
            vec![funding_input(0xaa, 0, 1), funding_input(0xbb, 1, 2)],
            vec![out(9, 70_000)],
        );
        let swapped = draft(
            vec![funding_input(0xaa, 0, 2), funding_input(0xbb, 1, 1)],
            vec![out(9, 70_000)],
        );

        let tx_straight = hex::decode(sign(&straight, NET).unwrap()).unwrap();
        let tx_swapped = hex::decode(sign(&swapped, NET).unwrap()).unwrap();

        let (_, pk_straight0) = extract_script_sig(&tx_straight, 0);
        let (_, pk_swapped0) = extract_script_sig(&tx_swapped, 0);
        assert_ne!(pk_straight0, pk_swapped0);
    }

    #[test]
    fn test_wrong_network_wif_rejected() {
        let mut payload = vec![Network::Mainnet.wif_version()];
        payload.extend_from_slice(&[3u8; 32]);
        payload.push(0x01);
        let mainnet_wif = bs58::encode(payload).with_check().into_string();

        let d = draft(
            vec![FundingInput {
                outpoint: OutpointRef {
                    source_id: hex::encode([0xaa; 32]),
                    source_index: 0,
                },
                key: SigningKey::new(mainnet_wif),
            }],
            vec![out(9, 1000)],
        );
        assert!(matches!(sign(&d, NET), Err(SignError::InvalidKey(_))));
    }

    #[test]
    fn test_garbage_key_rejected() {
        let d = draft(
            vec![FundingInput {
                outpoint: OutpointRef {
                    source_id: hex::encode([0xaa; 32]),
                    source_index: 0,
                },
                key: SigningKey::new("not-a-wif"),
            }],
            vec![out(9, 1000)],
        );
        assert!(matches!(sign(&d, NET), Err(SignError::InvalidKey(_))));
    }

    #[test]
    fn test_malformed_txid_rejected() {
        let d = draft(
            vec![FundingInput {
                outpoint: OutpointRef {
                    source_id: "abcd".to_string(),
                    source_index: 0,
                },
                key: SigningKey::new(test_wif(1)),
            }],
            vec![out(9, 1000)],
        );
        assert!(matches!(sign(&d, NET), Err(SignError::InvalidOutpoint(_))));
    }
}
