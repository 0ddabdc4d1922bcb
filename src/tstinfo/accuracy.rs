use std::ops::RangeInclusive;

use chrono::Duration;
use der::{Tag, TagNumber};

use crate::{
    errors::{TstInfoError, TstInfoErrorKind},
    reader::DerReader,
};

const MILLIS: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N0,
};

const MICROS: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N1,
};

/// ```text
/// Accuracy ::= SEQUENCE {
///     seconds  INTEGER           OPTIONAL,
///     millis   [0] INTEGER (1..999) OPTIONAL,
///     micros   [1] INTEGER (1..999) OPTIONAL }
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Accuracy {
    pub seconds: Option<u32>,
    pub millis: Option<u16>,
    pub micros: Option<u16>,
}

impl Accuracy {
    pub(crate) fn decode(reader: &mut DerReader<'_>) -> Result<Self, TstInfoError> {
        reader.read_sequence(|seq| {
            let seconds = read_component(seq, Tag::Integer, 0..=i64::from(u32::MAX), "seconds")?;
            let millis = read_component(seq, MILLIS, 1..=999, "millis")?;
            let micros = read_component(seq, MICROS, 1..=999, "micros")?;

            // casts are bounded by the ranges above
            Ok(Self {
                seconds: seconds.map(|v| v as u32),
                millis: millis.map(|v| v as u16),
                micros: micros.map(|v| v as u16),
            })
        })
    }

    pub fn to_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.seconds.unwrap_or(0)))
            + Duration::milliseconds(i64::from(self.millis.unwrap_or(0)))
            + Duration::microseconds(i64::from(self.micros.unwrap_or(0)))
    }
}

fn read_component(
    seq: &mut DerReader<'_>,
    tag: Tag,
    range: RangeInclusive<i64>,
    name: &str,
) -> Result<Option<i64>, TstInfoError> {
    if !seq.has_tag(tag) {
        return Ok(None);
    }

    let at = seq.position();
    let value = seq.read_tagged_integer(tag)?;
    if !range.contains(&value) {
        return Err(TstInfoError::new(
            TstInfoErrorKind::InvalidAccuracy,
            format!("{} = {} at offset {}", name, value, at),
        ));
    }

    Ok(Some(value))
}
