//! Little-endian cursor helpers shared by the fixed-layout codecs.

use lcl_types::{Address, CatalogId, Digest, ListingId, ADDRESS_LEN};

use crate::error::CodecError;

pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub(crate) fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn i32(&mut self, value: i32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn i64(&mut self, value: i64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn digest(&mut self, digest: &Digest) -> &mut Self {
        self.bytes(&digest.to_le_bytes())
    }

    pub(crate) fn listing_id(&mut self, id: &ListingId) -> &mut Self {
        self.bytes(&id.to_le_bytes())
    }

    pub(crate) fn catalog_id(&mut self, id: CatalogId) -> &mut Self {
        self.bytes(&id.to_le_bytes())
    }

    pub(crate) fn address(&mut self, address: &Address) -> &mut Self {
        self.bytes(address.as_bytes())
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Callers check the total length before reading, so running past the
    /// end here means a layout constant is wrong.
    pub(crate) fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }

    pub(crate) fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }

    pub(crate) fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.array())
    }

    pub(crate) fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.array())
    }

    pub(crate) fn digest(&mut self) -> Digest {
        Digest::from_le_bytes(self.array())
    }

    pub(crate) fn listing_id(&mut self) -> ListingId {
        ListingId::from_le_bytes(self.array())
    }

    pub(crate) fn catalog_id(&mut self) -> CatalogId {
        CatalogId(self.u64())
    }

    pub(crate) fn address(&mut self) -> Address {
        Address::new(self.array::<ADDRESS_LEN>())
    }

    pub(crate) fn skip(&mut self, len: usize) {
        self.pos += len;
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// Check an account's exact length.
pub(crate) fn expect_len(kind: &'static str, data: &[u8], expected: usize) -> Result<(), CodecError> {
    if data.len() != expected {
        return Err(CodecError::WrongLength {
            kind,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Check an account's 4-byte magic. `data` must be at least 4 bytes long.
pub(crate) fn expect_magic(kind: &'static str, data: &[u8], magic: &[u8; 4]) -> Result<(), CodecError> {
    let mut found = [0u8; 4];
    found.copy_from_slice(&data[..4]);
    if &found != magic {
        return Err(CodecError::BadMagic { kind, found });
    }
    Ok(())
}
