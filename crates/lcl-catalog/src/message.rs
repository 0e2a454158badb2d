//! Canonical signed payloads.
//!
//! A [`ListingMessage`] is the exact byte string a catalog signer vouches
//! for. The ledger parses record fields only out of verified message bytes.

use lcl_crypto::{Signature, SignatureError, SigningKey, VerifyingKey};
use lcl_types::Address;

use crate::attributes::AttributeTable;
use crate::error::CodecError;
use crate::layout::{expect_len, ByteReader, ByteWriter};
use crate::record::{ListingFields, FIELDS_LEN};

pub const MESSAGE_VERSION: u8 = 1;
/// Versions, listing fields, fee account, fee tokens.
pub const MESSAGE_LEN: usize = 2 + FIELDS_LEN + 32 + 8;

const REMOVAL_DOMAIN: &[u8] = b"lcl-remove-listing:";

/// Canonical listing payload, fields in record order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingMessage {
    pub fields: ListingFields,
    /// Carried for wire compatibility. Funding is handled elsewhere.
    pub fee_account: Address,
    pub fee_tokens: u64,
}

impl ListingMessage {
    pub fn new(fields: ListingFields) -> Self {
        Self {
            fields,
            fee_account: Address::zero(),
            fee_tokens: 0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(MESSAGE_LEN);
        w.u8(MESSAGE_VERSION).u8(self.fields.attributes.version);
        self.fields.write(&mut w);
        w.address(&self.fee_account).u64(self.fee_tokens);
        debug_assert_eq!(w.len(), MESSAGE_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        expect_len("listing message", data, MESSAGE_LEN)?;
        let mut r = ByteReader::new(data);
        let version = r.u8();
        if version != MESSAGE_VERSION {
            return Err(CodecError::UnsupportedVersion {
                kind: "listing message",
                version,
            });
        }
        let attribute_version = AttributeTable::for_version(r.u8())?.version();
        let fields = ListingFields::read(&mut r, attribute_version);
        Ok(Self {
            fields,
            fee_account: r.address(),
            fee_tokens: r.u64(),
        })
    }
}

/// Message bytes with a signature and the key that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestedListing {
    pub message: Vec<u8>,
    pub signature: Signature,
    pub signer: VerifyingKey,
}

impl AttestedListing {
    pub fn sign(key: &SigningKey, message: &ListingMessage) -> Self {
        let message = message.encode();
        Self {
            signature: key.sign(&message),
            signer: key.verifying_key(),
            message,
        }
    }

    pub fn verify(&self) -> Result<(), SignatureError> {
        self.signer.verify(&self.message, &self.signature)
    }
}

/// A manager's signed request to remove one listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalInstruction {
    pub listing: Address,
    pub manager: VerifyingKey,
    pub signature: Signature,
}

impl RemovalInstruction {
    pub fn sign(key: &SigningKey, listing: Address) -> Self {
        Self {
            listing,
            manager: key.verifying_key(),
            signature: key.sign(&Self::signing_bytes(&listing)),
        }
    }

    pub fn signing_bytes(listing: &Address) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(REMOVAL_DOMAIN.len() + 32);
        bytes.extend_from_slice(REMOVAL_DOMAIN);
        bytes.extend_from_slice(listing.as_bytes());
        bytes
    }

    pub fn verify(&self) -> Result<(), SignatureError> {
        self.manager
            .verify(&Self::signing_bytes(&self.listing), &self.signature)
    }
}
