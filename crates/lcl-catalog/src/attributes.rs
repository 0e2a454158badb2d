use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A boolean listing attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    CommerceEngine,
    EmploymentRelated,
    Event,
    InPerson,
    LocalDelivery,
    OnlineDownload,
    Organization,
    Person,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Self::CommerceEngine,
        Self::EmploymentRelated,
        Self::Event,
        Self::InPerson,
        Self::LocalDelivery,
        Self::OnlineDownload,
        Self::Organization,
        Self::Person,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CommerceEngine => "CommerceEngine",
            Self::EmploymentRelated => "EmploymentRelated",
            Self::Event => "Event",
            Self::InPerson => "InPerson",
            Self::LocalDelivery => "LocalDelivery",
            Self::OnlineDownload => "OnlineDownload",
            Self::Organization => "Organization",
            Self::Person => "Person",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| AttributeError::InvalidAttribute(s.to_string()))
    }
}

/// A set of attributes, independent of any bit layout.
pub type AttributeSet = BTreeSet<Attribute>;

/// Versioned mapping from attributes to bit positions.
///
/// Bit `i` (LSB first) of a packed byte is `order[i]`. A table is part of
/// the wire contract: once published under a version, its order never
/// changes. New orders get a new version.
#[derive(Debug, PartialEq, Eq)]
pub struct AttributeTable {
    version: u8,
    order: [Attribute; 8],
}

impl AttributeTable {
    pub const V1: AttributeTable = AttributeTable {
        version: 1,
        order: [
            Attribute::CommerceEngine,
            Attribute::EmploymentRelated,
            Attribute::Event,
            Attribute::InPerson,
            Attribute::LocalDelivery,
            Attribute::OnlineDownload,
            Attribute::Organization,
            Attribute::Person,
        ],
    };

    /// The table new records are written with.
    pub const CURRENT: &'static AttributeTable = &Self::V1;

    /// Look up a published table by version.
    pub fn for_version(version: u8) -> Result<&'static AttributeTable, AttributeError> {
        match version {
            1 => Ok(&Self::V1),
            other => Err(AttributeError::UnsupportedVersion(other)),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn order(&self) -> &[Attribute; 8] {
        &self.order
    }

    /// Bit position of `attribute` in this table.
    pub fn bit(&self, attribute: Attribute) -> Option<u8> {
        self.order
            .iter()
            .position(|a| *a == attribute)
            .map(|i| i as u8)
    }

    pub fn pack(&self, set: &AttributeSet) -> Result<Attributes, AttributeError> {
        let mut bits = 0u8;
        for attribute in set {
            let bit = self
                .bit(*attribute)
                .ok_or_else(|| AttributeError::InvalidAttribute(attribute.name().to_string()))?;
            bits |= 1 << bit;
        }
        Ok(Attributes {
            version: self.version,
            bits,
        })
    }

    /// Pack attribute names. Unknown names fail with `InvalidAttribute`.
    pub fn pack_names<I, S>(&self, names: I) -> Result<Attributes, AttributeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = names
            .into_iter()
            .map(|n| n.as_ref().trim().parse())
            .collect::<Result<AttributeSet, _>>()?;
        self.pack(&set)
    }

    pub fn unpack(&self, bits: u8) -> AttributeSet {
        self.order
            .iter()
            .enumerate()
            .filter(|(i, _)| bits & (1 << i) != 0)
            .map(|(_, a)| *a)
            .collect()
    }
}

/// A packed attribute byte together with the table version that packed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    pub version: u8,
    pub bits: u8,
}

impl Attributes {
    pub fn empty() -> Self {
        Self {
            version: AttributeTable::CURRENT.version(),
            bits: 0,
        }
    }

    /// Unpack using the table named by `version`.
    pub fn to_set(&self) -> Result<AttributeSet, AttributeError> {
        Ok(AttributeTable::for_version(self.version)?.unpack(self.bits))
    }

    pub fn contains(&self, attribute: Attribute) -> Result<bool, AttributeError> {
        let table = AttributeTable::for_version(self.version)?;
        Ok(table
            .bit(attribute)
            .is_some_and(|bit| self.bits & (1 << bit) != 0))
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<&AttributeSet> for Attributes {
    type Error = AttributeError;

    fn try_from(set: &AttributeSet) -> Result<Self, Self::Error> {
        AttributeTable::CURRENT.pack(set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("unsupported attribute table version {0}")]
    UnsupportedVersion(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn in_person_and_organization_pack_to_0x48() {
        let packed = AttributeTable::V1
            .pack_names(["InPerson", "Organization"])
            .unwrap();
        assert_eq!(packed.bits, 0b0100_1000);
        assert_eq!(packed.version, 1);
        let set = packed.to_set().unwrap();
        assert_eq!(
            set,
            AttributeSet::from([Attribute::InPerson, Attribute::Organization])
        );
    }

    #[test]
    fn first_attribute_is_least_significant_bit() {
        let set = AttributeSet::from([Attribute::CommerceEngine]);
        assert_eq!(AttributeTable::V1.pack(&set).unwrap().bits, 1);
        let set = AttributeSet::from([Attribute::Person]);
        assert_eq!(AttributeTable::V1.pack(&set).unwrap().bits, 0x80);
    }

    #[test]
    fn unknown_name_is_invalid_attribute() {
        let err = AttributeTable::V1.pack_names(["InPerson", "Teleport"]).unwrap_err();
        assert_eq!(err, AttributeError::InvalidAttribute("Teleport".into()));
    }

    #[test]
    fn unknown_table_version_rejected() {
        let attrs = Attributes { version: 9, bits: 1 };
        assert_eq!(attrs.to_set().unwrap_err(), AttributeError::UnsupportedVersion(9));
        assert!(AttributeTable::for_version(0).is_err());
    }

    #[test]
    fn contains_checks_single_bit() {
        let attrs = AttributeTable::V1.pack_names(["Event"]).unwrap();
        assert!(attrs.contains(Attribute::Event).unwrap());
        assert!(!attrs.contains(Attribute::Person).unwrap());
    }

    #[test]
    fn names_parse_and_display() {
        for attribute in Attribute::ALL {
            assert_eq!(attribute.to_string().parse::<Attribute>().unwrap(), attribute);
        }
    }

    proptest! {
        #[test]
        fn pack_unpack_is_identity(bits in any::<u8>()) {
            let set = AttributeTable::V1.unpack(bits);
            prop_assert_eq!(AttributeTable::V1.pack(&set).unwrap().bits, bits);
        }

        #[test]
        fn unpack_pack_is_identity(mask in any::<u8>()) {
            let set: AttributeSet = Attribute::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, a)| a)
                .collect();
            let packed = AttributeTable::V1.pack(&set).unwrap();
            prop_assert_eq!(packed.to_set().unwrap(), set);
        }
    }
}
