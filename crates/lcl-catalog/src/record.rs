//! Fixed-width listing record layout.
//!
//! Offsets of `category` and the locality filters are a public contract:
//! scanners match raw bytes at those positions without decoding anything
//! else. All integers are little-endian; digests are stored in their
//! little-endian form.

use lcl_types::{Address, CatalogId, Digest, ListingId};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeTable, Attributes};
use crate::coords::{Coordinates, COORDINATE_UNSET};
use crate::error::CodecError;
use crate::layout::{expect_len, expect_magic, ByteReader, ByteWriter};

pub const RECORD_MAGIC: [u8; 4] = *b"LSTG";
pub const RECORD_VERSION: u8 = 1;

pub const HEADER_LEN: usize = 8;
pub const UUID_OFFSET: usize = 8;
pub const CATALOG_OFFSET: usize = 24;
pub const CATEGORY_OFFSET: usize = 32;
pub const FILTER_OFFSETS: [usize; 3] = [48, 64, 80];
pub const ATTRIBUTES_OFFSET: usize = 96;
pub const LATITUDE_OFFSET: usize = 97;
pub const LONGITUDE_OFFSET: usize = 101;
pub const OWNER_OFFSET: usize = 105;
pub const LISTING_URL_OFFSET: usize = 137;
pub const LABEL_URL_OFFSET: usize = 169;
pub const DETAIL_URL_OFFSET: usize = 201;
pub const UPDATE_COUNT_OFFSET: usize = 233;
pub const UPDATE_TS_OFFSET: usize = 241;
pub const RECORD_LEN: usize = 249;

/// Encoded size of [`ListingFields`] (offsets 8..233 of a record).
pub const FIELDS_LEN: usize = UPDATE_COUNT_OFFSET - UUID_OFFSET;

/// The content of a listing: everything a writer controls.
///
/// The same encoding appears inside a stored record and inside a signed
/// listing message, so a verified message maps onto a record byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFields {
    pub uuid: ListingId,
    pub catalog_id: CatalogId,
    pub category: Digest,
    /// Unused filter slots hold the zero digest.
    pub filter_by: [Digest; 3],
    pub attributes: Attributes,
    /// Degrees × 10^7. See [`Coordinates`].
    pub latitude: i32,
    pub longitude: i32,
    pub owner: Address,
    pub listing_url: Address,
    pub label_url: Address,
    pub detail_url: Address,
}

impl ListingFields {
    /// Coordinates in degrees, or `None` when either axis is unset.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_fixed(self.latitude, self.longitude)
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        let (latitude, longitude) = coordinates
            .map(|c| c.to_fixed())
            .unwrap_or((COORDINATE_UNSET, COORDINATE_UNSET));
        self.latitude = latitude;
        self.longitude = longitude;
    }

    /// Non-zero filters in slot order.
    pub fn filters(&self) -> impl Iterator<Item = &Digest> {
        self.filter_by.iter().filter(|d| !d.is_zero())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.listing_id(&self.uuid)
            .catalog_id(self.catalog_id)
            .digest(&self.category);
        for filter in &self.filter_by {
            w.digest(filter);
        }
        w.u8(self.attributes.bits)
            .i32(self.latitude)
            .i32(self.longitude)
            .address(&self.owner)
            .address(&self.listing_url)
            .address(&self.label_url)
            .address(&self.detail_url);
    }

    /// Read the body. The attribute byte is paired with the version found
    /// in the enclosing header.
    pub(crate) fn read(r: &mut ByteReader<'_>, attribute_version: u8) -> Self {
        let uuid = r.listing_id();
        let catalog_id = r.catalog_id();
        let category = r.digest();
        let filter_by = [r.digest(), r.digest(), r.digest()];
        let attributes = Attributes {
            version: attribute_version,
            bits: r.u8(),
        };
        Self {
            uuid,
            catalog_id,
            category,
            filter_by,
            attributes,
            latitude: r.i32(),
            longitude: r.i32(),
            owner: r.address(),
            listing_url: r.address(),
            label_url: r.address(),
            detail_url: r.address(),
        }
    }
}

/// A stored listing: its fields plus the counters the ledger maintains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub fields: ListingFields,
    pub update_count: u64,
    /// Unix seconds of the last write.
    pub update_ts: i64,
}

impl ListingRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(RECORD_LEN);
        w.bytes(&RECORD_MAGIC)
            .u8(RECORD_VERSION)
            .u8(self.fields.attributes.version)
            .bytes(&[0, 0]);
        self.fields.write(&mut w);
        w.u64(self.update_count).i64(self.update_ts);
        debug_assert_eq!(w.len(), RECORD_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        expect_len("listing record", data, RECORD_LEN)?;
        expect_magic("listing record", data, &RECORD_MAGIC)?;
        let mut r = ByteReader::new(data);
        r.skip(4);
        let version = r.u8();
        if version != RECORD_VERSION {
            return Err(CodecError::UnsupportedVersion {
                kind: "listing record",
                version,
            });
        }
        let attribute_version = AttributeTable::for_version(r.u8())?.version();
        r.skip(2);
        let fields = ListingFields::read(&mut r, attribute_version);
        Ok(Self {
            fields,
            update_count: r.u64(),
            update_ts: r.i64(),
        })
    }

    /// Cheap check used by scans to skip other account kinds.
    pub fn is_listing(data: &[u8]) -> bool {
        data.len() == RECORD_LEN && data[..4] == RECORD_MAGIC
    }
}
