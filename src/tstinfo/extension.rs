use std::fmt::Display;

use der::Tag;

use crate::{
    asn1_types::Oid,
    errors::TstInfoError,
    reader::DerReader,
    utils::to_hex_str,
};

/// ```text
/// Extension ::= SEQUENCE {
///     extnID     OBJECT IDENTIFIER,
///     critical   BOOLEAN DEFAULT FALSE,
///     extnValue  OCTET STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extension {
    pub oid: Oid,
    pub critical: bool,
    pub value: Vec<u8>,
}

impl Extension {
    fn decode(reader: &mut DerReader<'_>) -> Result<Self, TstInfoError> {
        reader.read_sequence(|seq| {
            let oid = seq.read_oid()?;
            let critical = match seq.has_tag(Tag::Boolean) {
                true => seq.read_boolean()?,
                false => false,
            };
            let value = seq.read_octet_string()?.to_vec();

            Ok(Self {
                oid,
                critical,
                value,
            })
        })
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.oid)?;
        if self.critical {
            write!(f, " (critical)")?;
        }
        write!(f, ": {}", to_hex_str(&self.value))
    }
}

/// Extensions in encoding order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extensions(pub Vec<Extension>);

impl Extensions {
    /// Decodes `SEQUENCE OF Extension` carried under `tag`. An empty list is
    /// returned as is.
    pub(crate) fn decode(reader: &mut DerReader<'_>, tag: Tag) -> Result<Self, TstInfoError> {
        reader.read_constructed(tag, |list| {
            let mut extensions = vec![];
            while list.has_data() {
                extensions.push(Extension::decode(list)?);
            }

            Ok(Self(extensions))
        })
    }

    /// First extension with the given dotted OID. A malformed `oid` finds
    /// nothing.
    pub fn find(&self, oid: &str) -> Option<&Extension> {
        let oid: Oid = oid.parse().ok()?;
        self.0.iter().find(|ext| ext.oid == oid)
    }
}
