use std::{fmt::Display, str::FromStr};

use der::oid::{
    db::rfc5912::{ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512},
    ObjectIdentifier,
};

use crate::errors::{TstInfoError, TstInfoErrorKind};

/// id-ct-TSTInfo, the eContentType of a TimeStampToken.
pub const ID_CT_TST_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

/// Decoded OBJECT IDENTIFIER.
///
/// Arcs are kept as `u64` so identifiers outside the range of
/// [`ObjectIdentifier`] (long private arcs, more than 39 bytes) still decode.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Oid(Vec<u64>);

impl Oid {
    pub(crate) fn from_arcs(arcs: Vec<u64>) -> Self {
        Self(arcs)
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    /// Converts to a [`ObjectIdentifier`] when it fits.
    ///
    /// `ObjectIdentifier` arcs are `u32`; any wider arc yields `None`.
    pub fn to_object_identifier(&self) -> Option<ObjectIdentifier> {
        let arcs = self
            .0
            .iter()
            .map(|arc| u32::try_from(*arc).ok())
            .collect::<Option<Vec<u32>>>()?;
        ObjectIdentifier::from_arcs(arcs).ok()
    }

    /// Arc-wise comparison with a known identifier.
    pub fn matches(&self, oid: &ObjectIdentifier) -> bool {
        self.0.iter().copied().eq(oid.arcs().map(u64::from))
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>()
                .join(".")
        )
    }
}

impl FromStr for Oid {
    type Err = TstInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| {
                if !is_canonical_arc(arc) {
                    return Err(TstInfoError::new(TstInfoErrorKind::InvalidOid, s));
                }
                arc.parse::<u64>()
                    .map_err(|_| TstInfoError::new(TstInfoErrorKind::InvalidOid, s))
            })
            .collect::<Result<Vec<u64>, TstInfoError>>()?;

        match arcs.as_slice() {
            [first, second, ..] if *first <= 2 && (*first == 2 || *second < 40) => Ok(Self(arcs)),
            _ => Err(TstInfoError::new(TstInfoErrorKind::InvalidOid, s)),
        }
    }
}

// Decimal digits, no sign and no leading zeros.
fn is_canonical_arc(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'))
}

fn arc_eq(text: &str, arc: u64) -> bool {
    is_canonical_arc(text) && text.parse::<u64>() == Ok(arc)
}

impl PartialEq<str> for Oid {
    fn eq(&self, other: &str) -> bool {
        let mut parts = other.split('.');
        self.0
            .iter()
            .all(|arc| parts.next().is_some_and(|part| arc_eq(part, *arc)))
            && parts.next().is_none()
    }
}

impl PartialEq<&str> for Oid {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// ```text
/// AlgorithmIdentifier ::= SEQUENCE {
///     algorithm   OBJECT IDENTIFIER,
///     parameters  ANY DEFINED BY algorithm OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlgorithmIdentifier {
    pub oid: Oid,
    /// Full DER encoding of the parameters element, e.g. `05 00` for NULL.
    pub parameters: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Unsupported(String),
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Unsupported(oid) => write!(f, "Unsupported({})", oid),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl From<&Oid> for HashAlgorithm {
    fn from(value: &Oid) -> Self {
        [
            (ID_SHA_1, Self::Sha1),
            (ID_SHA_224, Self::Sha224),
            (ID_SHA_256, Self::Sha256),
            (ID_SHA_384, Self::Sha384),
            (ID_SHA_512, Self::Sha512),
        ]
        .into_iter()
        .find(|(oid, _)| value.matches(oid))
        .map(|(_, alg)| alg)
        .unwrap_or_else(|| Self::Unsupported(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_parse_and_display() {
        let oid: Oid = "2.16.840.1.101.3.4.2.1".parse().unwrap();
        assert_eq!(oid.arcs(), &[2, 16, 840, 1, 101, 3, 4, 2, 1]);
        assert_eq!(oid.to_string(), "2.16.840.1.101.3.4.2.1");
        assert_eq!(oid, "2.16.840.1.101.3.4.2.1");
    }

    #[test]
    fn oid_parse_rejects_malformed() {
        for s in ["", "1", "1..2", "3.1", "1.40", "1.2.x", "1.2.-3", "1.2.03", "1.+2"] {
            assert_eq!(
                s.parse::<Oid>().unwrap_err().kind,
                TstInfoErrorKind::InvalidOid,
                "{}",
                s
            );
        }
    }

    #[test]
    fn hash_algorithm_from_oid() {
        let sha256: Oid = "2.16.840.1.101.3.4.2.1".parse().unwrap();
        assert_eq!(HashAlgorithm::from(&sha256), HashAlgorithm::Sha256);

        let sha1: Oid = "1.3.14.3.2.26".parse().unwrap();
        assert_eq!(HashAlgorithm::from(&sha1), HashAlgorithm::Sha1);

        let md5: Oid = "1.2.840.113549.2.5".parse().unwrap();
        assert_eq!(
            HashAlgorithm::from(&md5),
            HashAlgorithm::Unsupported("1.2.840.113549.2.5".to_owned())
        );
    }

    #[test]
    fn oversized_arc_has_no_object_identifier() {
        let oid = Oid::from_arcs(vec![1, 2, u64::MAX]);
        assert!(oid.to_object_identifier().is_none());
        assert_eq!(HashAlgorithm::from(&oid).to_string(), format!("Unsupported(1.2.{})", u64::MAX));
    }

    #[test]
    fn wide_arc_is_not_a_known_digest() {
        // 2^32 + 1 truncates to the last sha256 arc when narrowed to u32.
        let oid: Oid = "2.16.840.1.101.3.4.2.4294967297".parse().unwrap();
        assert!(oid.to_object_identifier().is_none());
        assert!(!oid.matches(&ID_SHA_256));
        assert_eq!(
            HashAlgorithm::from(&oid),
            HashAlgorithm::Unsupported("2.16.840.1.101.3.4.2.4294967297".to_owned())
        );

        let widest: Oid = "2.16.840.1.101.3.4.2.4294967295".parse().unwrap();
        assert!(widest.to_object_identifier().is_some());
        assert!(!widest.matches(&ID_SHA_256));
    }

    #[test]
    fn oid_str_comparison_is_exact() {
        let oid: Oid = "1.2.3".parse().unwrap();
        assert_eq!(oid, "1.2.3");
        for other in ["1.2", "1.2.3.4", "1.2.03", "1.2.+3", "1.2.3.", "", "1.2.x"] {
            assert!(oid != other, "{}", other);
        }
        assert_eq!(Oid::from_arcs(vec![0, 0]), "0.0");
    }
}
