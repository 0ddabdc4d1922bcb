use crate::{
    asn1_types::{AlgorithmIdentifier, HashAlgorithm},
    errors::{TstInfoError, TstInfoErrorKind},
    reader::DerReader,
};

/// ```text
/// MessageImprint ::= SEQUENCE {
///     hashAlgorithm  AlgorithmIdentifier,
///     hashedMessage  OCTET STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageImprint {
    pub hash_algorithm: AlgorithmIdentifier,
    pub hashed_message: Vec<u8>,
}

impl MessageImprint {
    pub(crate) fn decode(reader: &mut DerReader<'_>) -> Result<Self, TstInfoError> {
        reader.read_sequence(|seq| {
            let hash_algorithm = seq.read_sequence(|alg| {
                let oid = alg.read_oid()?;
                let parameters = match alg.has_data() {
                    true => Some(alg.read_any()?.to_vec()),
                    false => None,
                };

                Ok(AlgorithmIdentifier { oid, parameters })
            })?;

            let at = seq.position();
            let hashed_message = seq.read_octet_string()?;
            if hashed_message.is_empty() {
                return Err(TstInfoError::new(
                    TstInfoErrorKind::EmptyField,
                    format!("hashed message at offset {}", at),
                ));
            }

            Ok(Self {
                hash_algorithm,
                hashed_message: hashed_message.to_vec(),
            })
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        (&self.hash_algorithm.oid).into()
    }
}
