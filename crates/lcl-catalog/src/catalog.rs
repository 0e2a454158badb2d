use lcl_types::{Address, CatalogId};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::layout::{expect_len, expect_magic, ByteReader, ByteWriter};

pub const CATALOG_MAGIC: [u8; 4] = *b"CTLG";
pub const CATALOG_VERSION: u8 = 1;
pub const CATALOG_LEN: usize = 80;

/// A tenant namespace and the two keys that govern it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub catalog_id: CatalogId,
    /// Key whose signatures admit listing messages.
    pub signer_authority: Address,
    /// Key allowed to remove listings.
    pub manager_authority: Address,
}

impl Catalog {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(CATALOG_LEN);
        w.bytes(&CATALOG_MAGIC)
            .u8(CATALOG_VERSION)
            .bytes(&[0, 0, 0])
            .catalog_id(self.catalog_id)
            .address(&self.signer_authority)
            .address(&self.manager_authority);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        expect_len("catalog", data, CATALOG_LEN)?;
        expect_magic("catalog", data, &CATALOG_MAGIC)?;
        let mut r = ByteReader::new(data);
        r.skip(4);
        let version = r.u8();
        if version != CATALOG_VERSION {
            return Err(CodecError::UnsupportedVersion {
                kind: "catalog",
                version,
            });
        }
        r.skip(3);
        Ok(Self {
            catalog_id: r.catalog_id(),
            signer_authority: r.address(),
            manager_authority: r.address(),
        })
    }
}
