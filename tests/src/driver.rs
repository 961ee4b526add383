// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key derivation for tests, from a bip39 mnemonic via BIP-32

use bip39::{Language, Mnemonic, Seed};
use bitcoin::{
    bip32::{ChildNumber, Xpriv},
    secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey},
    NetworkKind,
};
use log::debug;
use zeroize::Zeroize;

use ledger_btc_core::{
    engine::{Driver, Error, SigningNode},
    tx::PublicKey as CompressedKey,
};

/// Mnemonic shared by the signing test vectors
pub const MNEMONIC: &str = "all all all all all all all all all all all all";

/// Curves this driver can derive for
const CURVES: &[&str] = &["secp256k1", "secp256k1-decred"];

/// Test driver, deriving nodes from a bip39 seed
pub struct TestDriver {
    seed: [u8; 64],
}

impl TestDriver {
    /// Create a driver from a bip39 mnemonic (without passphrase)
    pub fn new(phrase: &str) -> anyhow::Result<Self> {
        let m = Mnemonic::from_phrase(phrase, Language::English)?;

        let mut seed = [0u8; 64];
        seed.copy_from_slice(Seed::new(&m, "").as_bytes());

        Ok(Self { seed })
    }

    /// Extended private key for a path
    pub fn xpriv(&self, path: &[u32]) -> anyhow::Result<Xpriv> {
        let secp = Secp256k1::signing_only();

        let master = Xpriv::new_master(NetworkKind::Test, &self.seed)?;
        let path: Vec<ChildNumber> = path.iter().map(|n| ChildNumber::from(*n)).collect();

        Ok(master.derive_priv(&secp, &path)?)
    }

    /// Compressed public key for a path
    pub fn public_key(&self, path: &[u32]) -> anyhow::Result<PublicKey> {
        let k = self.xpriv(path)?;
        Ok(PublicKey::from_secret_key(
            &Secp256k1::signing_only(),
            &k.private_key,
        ))
    }

    /// Check a DER signature over `digest` against the key for a path
    pub fn verify(&self, path: &[u32], digest: &[u8; 32], der: &[u8]) -> anyhow::Result<()> {
        let pubkey = self.public_key(path)?;
        let sig = ecdsa::Signature::from_der(der)?;

        Secp256k1::verification_only().verify_ecdsa(
            &Message::from_digest(*digest),
            &sig,
            &pubkey,
        )?;

        Ok(())
    }
}

impl Default for TestDriver {
    fn default() -> Self {
        // MNEMONIC is a valid english phrase
        Self::new(MNEMONIC).unwrap()
    }
}

impl Drop for TestDriver {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl Driver for TestDriver {
    type Node = TestNode;

    fn derive(&self, path: &[u32], curve: &str) -> Result<TestNode, Error> {
        if !CURVES.contains(&curve) {
            return Err(Error::DeriveFailed);
        }

        let k = self.xpriv(path).map_err(|e| {
            debug!("derivation failed: {}", e);
            Error::DeriveFailed
        })?;

        Ok(TestNode {
            secret: k.private_key.secret_bytes(),
        })
    }
}

/// Derived signing node
pub struct TestNode {
    secret: [u8; 32],
}

impl TestNode {
    fn secret_key(&self) -> Result<SecretKey, Error> {
        SecretKey::from_slice(&self.secret).map_err(|_| Error::SignError)
    }
}

impl Zeroize for TestNode {
    fn zeroize(&mut self) {
        self.secret.zeroize();
    }
}

impl SigningNode for TestNode {
    fn public_key(&self) -> CompressedKey {
        match self.secret_key() {
            Ok(sk) => PublicKey::from_secret_key(&Secp256k1::signing_only(), &sk).serialize(),
            Err(_) => [0u8; 33],
        }
    }

    fn sign(&self, digest: &[u8; 32]) -> Result<[u8; 64], Error> {
        let sk = self.secret_key()?;
        let sig = Secp256k1::signing_only().sign_ecdsa(&Message::from_digest(*digest), &sk);

        Ok(sig.serialize_compact())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use ledger_btc_core::tx::HARDENED;

    #[test]
    fn derive_known_key() {
        let d = TestDriver::default();

        let path = [49 | HARDENED, 1 | HARDENED, HARDENED, 1, 0];
        let n = d.derive(&path, "secp256k1").unwrap();

        assert_eq!(
            hex::encode(n.public_key()),
            "03e7bfe10708f715e8538c92d46ca50db6f657bbc455b7494e6a0303ccdb868b79"
        );
    }

    #[test]
    fn unknown_curve() {
        let d = TestDriver::default();

        assert_eq!(
            d.derive(&[HARDENED], "ed25519").err(),
            Some(Error::DeriveFailed)
        );
    }

    #[test]
    fn sign_verify() {
        let d = TestDriver::default();
        let path = [44 | HARDENED, 1 | HARDENED, HARDENED, 0, 0];

        let n = d.derive(&path, "secp256k1").unwrap();
        let digest = [0x5a; 32];

        let compact = n.sign(&digest).unwrap();
        let der = ecdsa::Signature::from_compact(&compact)
            .unwrap()
            .serialize_der();

        d.verify(&path, &digest, &der).unwrap();
    }

    #[test]
    fn zeroized_node() {
        let d = TestDriver::default();
        let mut n = d.derive(&[HARDENED], "secp256k1").unwrap();

        n.zeroize();

        assert_eq!(n.public_key(), [0u8; 33]);
        assert_eq!(n.sign(&[1u8; 32]), Err(Error::SignError));
    }
}
