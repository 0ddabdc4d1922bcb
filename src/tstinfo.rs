mod accuracy;
mod extension;
mod imprint;

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use der::{Tag, TagNumber};

pub use accuracy::Accuracy;
pub use extension::{Extension, Extensions};
pub use imprint::MessageImprint;

use crate::{
    asn1_types::Oid,
    errors::{TstInfoError, TstInfoErrorKind},
    reader::DerReader,
    utils::{to_hex_str, IndentString},
};

const TSA: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

const EXTENSIONS: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N1,
};

/// ```text
/// TSTInfo ::= SEQUENCE {
///     version         INTEGER { v1(1) },
///     policy          TSAPolicyId,
///     messageImprint  MessageImprint,
///     serialNumber    INTEGER,
///     genTime         GeneralizedTime,
///     accuracy        Accuracy                OPTIONAL,
///     ordering        BOOLEAN                 DEFAULT FALSE,
///     nonce           INTEGER                 OPTIONAL,
///     tsa             [0] GeneralName         OPTIONAL,
///     extensions      [1] IMPLICIT Extensions OPTIONAL }
/// ```
///
/// Only obtainable through [`TstInfo::from_der`] and friends, so every value
/// satisfies the grammar: the serial number is non-empty and `extensions`, if
/// present, holds at least one entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TstInfo {
    version: i64,
    policy: Oid,
    message_imprint: MessageImprint,
    serial_number: Vec<u8>,
    gen_time: DateTime<Utc>,
    accuracy: Option<Accuracy>,
    ordering: bool,
    nonce: Option<Vec<u8>>,
    tsa: Option<Vec<u8>>,
    extensions: Option<Extensions>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Field {
    Version,
    Policy,
    MessageImprint,
    SerialNumber,
    GenTime,
    Accuracy,
    Ordering,
    Nonce,
    Tsa,
    Extensions,
}

#[derive(Clone, Copy, Debug)]
enum Presence {
    Required,
    /// Decoded only when the next element carries this tag.
    Optional(Tag),
}

// RFC 3161 field order. Optional fields are recognized by lookahead alone, so
// each step depends on the previous one having been consumed.
const GRAMMAR: [(Field, Presence); 10] = [
    (Field::Version, Presence::Required),
    (Field::Policy, Presence::Required),
    (Field::MessageImprint, Presence::Required),
    (Field::SerialNumber, Presence::Required),
    (Field::GenTime, Presence::Required),
    (Field::Accuracy, Presence::Optional(Tag::Sequence)),
    (Field::Ordering, Presence::Optional(Tag::Boolean)),
    (Field::Nonce, Presence::Optional(Tag::Integer)),
    (Field::Tsa, Presence::Optional(TSA)),
    (Field::Extensions, Presence::Optional(EXTENSIONS)),
];

/// Fields collected while walking [`GRAMMAR`].
#[derive(Default)]
struct Fields {
    version: Option<i64>,
    policy: Option<Oid>,
    message_imprint: Option<MessageImprint>,
    serial_number: Option<Vec<u8>>,
    gen_time: Option<DateTime<Utc>>,
    accuracy: Option<Accuracy>,
    ordering: Option<bool>,
    nonce: Option<Vec<u8>>,
    tsa: Option<Vec<u8>>,
    extensions: Option<Extensions>,
}

impl Fields {
    fn read(&mut self, field: Field, reader: &mut DerReader<'_>) -> Result<(), TstInfoError> {
        match field {
            Field::Version => self.version = Some(reader.read_integer()?),
            Field::Policy => self.policy = Some(reader.read_oid()?),
            Field::MessageImprint => self.message_imprint = Some(MessageImprint::decode(reader)?),
            Field::SerialNumber => {
                self.serial_number = Some(reader.read_integer_bytes()?.to_vec());
            }
            Field::GenTime => self.gen_time = Some(reader.read_generalized_time()?),
            Field::Accuracy => self.accuracy = Some(Accuracy::decode(reader)?),
            Field::Ordering => self.ordering = Some(reader.read_boolean()?),
            Field::Nonce => self.nonce = Some(reader.read_integer_bytes()?.to_vec()),
            Field::Tsa => self.tsa = Some(reader.read_value(TSA)?.to_vec()),
            Field::Extensions => self.extensions = Some(Extensions::decode(reader, EXTENSIONS)?),
        }

        Ok(())
    }

    fn assemble(self) -> Result<TstInfo, TstInfoError> {
        fn required<T>(value: Option<T>, field: Field) -> Result<T, TstInfoError> {
            value.ok_or_else(|| {
                TstInfoError::new(TstInfoErrorKind::UnexpectedTag, format!("missing {:?}", field))
            })
        }

        let serial_number = required(self.serial_number, Field::SerialNumber)?;
        if serial_number.is_empty() {
            return Err(TstInfoError::new(
                TstInfoErrorKind::EmptyField,
                "serial number",
            ));
        }
        if matches!(&self.extensions, Some(extensions) if extensions.0.is_empty()) {
            return Err(TstInfoError::new(TstInfoErrorKind::EmptyField, "extensions"));
        }

        Ok(TstInfo {
            version: required(self.version, Field::Version)?,
            policy: required(self.policy, Field::Policy)?,
            message_imprint: required(self.message_imprint, Field::MessageImprint)?,
            serial_number,
            gen_time: required(self.gen_time, Field::GenTime)?,
            accuracy: self.accuracy,
            ordering: self.ordering.unwrap_or(false),
            nonce: self.nonce,
            tsa: self.tsa,
            extensions: self.extensions,
        })
    }
}

impl TstInfo {
    /// Decodes one DER-encoded TSTInfo. The buffer must hold exactly one
    /// element.
    pub fn from_der(bytes: &[u8]) -> Result<Self, TstInfoError> {
        let decoded = DerReader::new(bytes).and_then(|mut reader| {
            let tst_info = reader.read_sequence(Self::decode)?;
            reader.finish()?;
            Ok(tst_info)
        });

        match &decoded {
            Ok(tst_info) => log::trace!(
                "decoded TSTInfo serial {} at {}",
                to_hex_str(&tst_info.serial_number),
                tst_info.gen_time
            ),
            Err(err) => log::debug!("rejected TSTInfo ({} bytes): {}", bytes.len(), err),
        }

        decoded
    }

    fn decode(reader: &mut DerReader<'_>) -> Result<Self, TstInfoError> {
        let mut fields = Fields::default();

        for (field, presence) in GRAMMAR {
            let present = match presence {
                Presence::Required => true,
                Presence::Optional(tag) => reader.has_data() && reader.has_tag(tag),
            };
            if present {
                fields.read(field, reader)?;
            }
        }

        // unknown trailing fields
        reader.finish()?;

        fields.assemble()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_v1(&self) -> bool {
        self.version == 1
    }

    pub fn policy(&self) -> &Oid {
        &self.policy
    }

    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    /// Big-endian INTEGER content octets, including any 0x00 sign byte.
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    pub fn gen_time(&self) -> DateTime<Utc> {
        self.gen_time
    }

    pub fn accuracy(&self) -> Option<&Accuracy> {
        self.accuracy.as_ref()
    }

    pub fn ordering(&self) -> bool {
        self.ordering
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    /// DER encoding of the TSA GeneralName.
    pub fn tsa(&self) -> Option<&[u8]> {
        self.tsa.as_deref()
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.extensions.as_ref()
    }
}

impl Display for TstInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TSTInfo:")?;
        writeln!(f, "{}", format!("Version: {}", self.version).indent(4))?;
        writeln!(f, "{}", format!("Policy: {}", self.policy).indent(4))?;
        writeln!(
            f,
            "{}",
            format!(
                "Message Imprint:\n    Algorithm: {}\n    Hashed Message: {}",
                self.message_imprint.algorithm(),
                to_hex_str(&self.message_imprint.hashed_message)
            )
            .indent(4)
        )?;
        writeln!(
            f,
            "{}",
            format!("Serial Number: {}", to_hex_str(&self.serial_number)).indent(4)
        )?;
        writeln!(
            f,
            "{}",
            format!(
                "Gen Time: {}",
                self.gen_time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            )
            .indent(4)
        )?;
        if let Some(accuracy) = &self.accuracy {
            let components = [
                accuracy.seconds.map(|v| format!("{}s", v)),
                accuracy.millis.map(|v| format!("{}ms", v)),
                accuracy.micros.map(|v| format!("{}us", v)),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<String>>();
            let components = match components.is_empty() {
                true => "unspecified".to_owned(),
                false => components.join(" "),
            };
            writeln!(f, "{}", format!("Accuracy: {}", components).indent(4))?;
        }
        writeln!(f, "{}", format!("Ordering: {}", self.ordering).indent(4))?;
        if let Some(nonce) = &self.nonce {
            writeln!(f, "{}", format!("Nonce: {}", to_hex_str(nonce)).indent(4))?;
        }
        if let Some(tsa) = &self.tsa {
            writeln!(f, "{}", format!("TSA: {}", to_hex_str(tsa)).indent(4))?;
        }
        if let Some(extensions) = &self.extensions {
            writeln!(f, "{}", "Extensions:".indent(4))?;
            for ext in &extensions.0 {
                writeln!(f, "{}", ext.to_string().indent(8))?;
            }
        }

        Ok(())
    }
}
