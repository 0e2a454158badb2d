//! Marker left at a listing address after a manager removes the listing.
//!
//! The address stays occupied so the removed listing cannot be recreated
//! by resubmitting a message signed before the removal. Its magic differs
//! from a record's, so prefix scans never report it.

use lcl_types::{Address, CatalogId, ListingId};
use serde::Serialize;

use crate::error::CodecError;
use crate::layout::{expect_len, expect_magic, ByteReader, ByteWriter};

pub const TOMBSTONE_MAGIC: [u8; 4] = *b"LRMV";
pub const TOMBSTONE_VERSION: u8 = 1;
/// Header, uuid, catalog id, manager, removal time.
pub const TOMBSTONE_LEN: usize = 8 + 16 + 8 + 32 + 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tombstone {
    pub uuid: ListingId,
    pub catalog_id: CatalogId,
    pub removed_by: Address,
    /// Unix seconds.
    pub removed_ts: i64,
}

impl Tombstone {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(TOMBSTONE_LEN);
        w.bytes(&TOMBSTONE_MAGIC)
            .u8(TOMBSTONE_VERSION)
            .bytes(&[0, 0, 0])
            .listing_id(&self.uuid)
            .catalog_id(self.catalog_id)
            .address(&self.removed_by)
            .i64(self.removed_ts);
        debug_assert_eq!(w.len(), TOMBSTONE_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        expect_len("tombstone", data, TOMBSTONE_LEN)?;
        expect_magic("tombstone", data, &TOMBSTONE_MAGIC)?;
        let mut r = ByteReader::new(data);
        r.skip(4);
        let version = r.u8();
        if version != TOMBSTONE_VERSION {
            return Err(CodecError::UnsupportedVersion {
                kind: "tombstone",
                version,
            });
        }
        r.skip(3);
        Ok(Self {
            uuid: r.listing_id(),
            catalog_id: r.catalog_id(),
            removed_by: r.address(),
            removed_ts: r.i64(),
        })
    }

    pub fn is_tombstone(data: &[u8]) -> bool {
        data.len() == TOMBSTONE_LEN && data[..4] == TOMBSTONE_MAGIC
    }
}
