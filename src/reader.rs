use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use der::{Decode, Header, Reader, SliceReader, Tag};

use crate::{
    asn1_types::Oid,
    errors::{TstInfoError, TstInfoErrorKind, TstInfoResult},
    utils::to_hex_str,
};

/// Deepest nested scope a [`DerReader`] will open.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Forward-only DER reader over one encoded region.
///
/// `has_*` methods peek, `read_*` methods consume. Constructed elements are
/// decoded through [`DerReader::read_constructed`], which hands the closure a
/// reader scoped to the element's content and fails unless that content is
/// consumed completely.
pub struct DerReader<'a> {
    bytes: &'a [u8],
    inner: SliceReader<'a>,
    // offset of `bytes` in the outermost buffer
    base: usize,
    depth: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, TstInfoError> {
        Self::scoped(bytes, 0, 0)
    }

    fn scoped(bytes: &'a [u8], base: usize, depth: usize) -> Result<Self, TstInfoError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(TstInfoError::new(
                TstInfoErrorKind::NestingTooDeep,
                format!("depth {} at offset {}", depth, base),
            ));
        }

        let inner = SliceReader::new(bytes).map_app_err(TstInfoErrorKind::Truncated)?;

        Ok(Self {
            bytes,
            inner,
            base,
            depth,
        })
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.base + self.offset()
    }

    fn offset(&self) -> usize {
        usize::try_from(self.inner.position()).unwrap_or(self.bytes.len())
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset())
    }

    pub fn has_data(&self) -> bool {
        self.remaining() > 0
    }

    pub fn peek_tag(&self) -> Option<Tag> {
        if !self.has_data() {
            return None;
        }
        self.inner.peek_tag().ok()
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.peek_tag() == Some(tag)
    }

    /// Fails if any byte of the current scope is left unread.
    pub fn finish(&self) -> Result<(), TstInfoError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(TstInfoError::new(
                TstInfoErrorKind::TrailingData,
                format!("{} bytes at offset {}", n, self.position()),
            )),
        }
    }

    fn read_header(&mut self) -> Result<Header, TstInfoError> {
        let at = self.position();

        Header::decode(&mut self.inner).map_err(|err| {
            let kind = match err.kind() {
                der::ErrorKind::Incomplete { .. } => TstInfoErrorKind::Truncated,
                _ => TstInfoErrorKind::InvalidHeader,
            };
            TstInfoError::new(kind, format!("{} at offset {}", err, at))
        })
    }

    fn read_content(&mut self, header: Header) -> Result<&'a [u8], TstInfoError> {
        let at = self.position();

        self.inner.read_slice(header.length).map_err(|err| {
            TstInfoError::new(
                TstInfoErrorKind::Truncated,
                format!("{} content: {} at offset {}", header.tag, err, at),
            )
        })
    }

    /// Reads an element with tag `expected` and returns its content octets.
    pub fn read_value(&mut self, expected: Tag) -> Result<&'a [u8], TstInfoError> {
        let at = self.position();
        if !self.has_data() {
            return Err(TstInfoError::new(
                TstInfoErrorKind::UnexpectedTag,
                format!("missing {} at offset {}", expected, at),
            ));
        }

        let header = self.read_header()?;
        if header.tag != expected {
            return Err(TstInfoError::new(
                TstInfoErrorKind::UnexpectedTag,
                format!("expected {}, found {} at offset {}", expected, header.tag, at),
            ));
        }

        self.read_content(header)
    }

    /// Reads one element of any tag and returns its full encoding.
    pub fn read_any(&mut self) -> Result<&'a [u8], TstInfoError> {
        let start = self.offset();
        let header = self.read_header()?;
        self.read_content(header)?;

        Ok(&self.bytes[start..self.offset()])
    }

    pub fn read_constructed<T, F>(&mut self, tag: Tag, f: F) -> Result<T, TstInfoError>
    where
        F: FnOnce(&mut DerReader<'a>) -> Result<T, TstInfoError>,
    {
        let content = self.read_value(tag)?;
        let base = self.position() - content.len();

        let mut nested = Self::scoped(content, base, self.depth + 1)?;
        let value = f(&mut nested)?;
        nested.finish()?;

        Ok(value)
    }

    pub fn read_sequence<T, F>(&mut self, f: F) -> Result<T, TstInfoError>
    where
        F: FnOnce(&mut DerReader<'a>) -> Result<T, TstInfoError>,
    {
        self.read_constructed(Tag::Sequence, f)
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8], TstInfoError> {
        self.read_value(Tag::OctetString)
    }

    /// Raw big-endian content octets of an INTEGER.
    pub fn read_integer_bytes(&mut self) -> Result<&'a [u8], TstInfoError> {
        self.read_integer_content(Tag::Integer)
    }

    pub fn read_integer(&mut self) -> Result<i64, TstInfoError> {
        self.read_tagged_integer(Tag::Integer)
    }

    /// Reads an INTEGER carried under an IMPLICIT tag.
    pub fn read_tagged_integer(&mut self, tag: Tag) -> Result<i64, TstInfoError> {
        let at = self.position();
        let content = self.read_integer_content(tag)?;

        if content.len() > 8 {
            return Err(TstInfoError::new(
                TstInfoErrorKind::InvalidInteger,
                format!("{}-byte integer out of range at offset {}", content.len(), at),
            ));
        }

        let init: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(content
            .iter()
            .fold(init, |acc, &b| (acc << 8) | i64::from(b)))
    }

    fn read_integer_content(&mut self, tag: Tag) -> Result<&'a [u8], TstInfoError> {
        let at = self.position();
        let content = self.read_value(tag)?;

        match content {
            [] => Err(TstInfoError::new(
                TstInfoErrorKind::EmptyField,
                format!("zero-length integer at offset {}", at),
            )),
            [0x00, next, ..] if next & 0x80 == 0 => Err(TstInfoError::new(
                TstInfoErrorKind::InvalidInteger,
                format!("redundant leading 0x00 at offset {}", at),
            )),
            [0xff, next, ..] if next & 0x80 != 0 => Err(TstInfoError::new(
                TstInfoErrorKind::InvalidInteger,
                format!("redundant leading 0xff at offset {}", at),
            )),
            _ => Ok(content),
        }
    }

    pub fn read_oid(&mut self) -> Result<Oid, TstInfoError> {
        let at = self.position();
        let content = self.read_value(Tag::ObjectIdentifier)?;

        decode_arcs(content).map(Oid::from_arcs).ok_or_else(|| {
            TstInfoError::new(
                TstInfoErrorKind::InvalidOid,
                format!("{} at offset {}", to_hex_str(content), at),
            )
        })
    }

    pub fn read_generalized_time(&mut self) -> Result<DateTime<Utc>, TstInfoError> {
        let at = self.position();
        let content = self.read_value(Tag::GeneralizedTime)?;

        parse_generalized_time(content).ok_or_else(|| {
            TstInfoError::new(
                TstInfoErrorKind::InvalidGeneralizedTime,
                format!("{:?} at offset {}", String::from_utf8_lossy(content), at),
            )
        })
    }

    /// Only the canonical DER values 0x00 and 0xFF are accepted.
    pub fn read_boolean(&mut self) -> Result<bool, TstInfoError> {
        let at = self.position();

        match self.read_value(Tag::Boolean)? {
            [0x00] => Ok(false),
            [0xff] => Ok(true),
            content => Err(TstInfoError::new(
                TstInfoErrorKind::InvalidBoolean,
                format!("{} at offset {}", to_hex_str(content), at),
            )),
        }
    }
}

fn decode_arcs(content: &[u8]) -> Option<Vec<u64>> {
    // the last subidentifier must terminate
    if content.last()? & 0x80 != 0 {
        return None;
    }

    let mut subidentifiers = Vec::new();
    let mut value: u64 = 0;
    let mut leading = true;

    for &byte in content {
        if leading && byte == 0x80 {
            return None;
        }
        if value > u64::MAX >> 7 {
            return None;
        }

        value = (value << 7) | u64::from(byte & 0x7f);
        leading = false;

        if byte & 0x80 == 0 {
            subidentifiers.push(value);
            value = 0;
            leading = true;
        }
    }

    let first = subidentifiers[0];
    let (root, second) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut arcs = Vec::with_capacity(subidentifiers.len() + 1);
    arcs.push(root);
    arcs.push(second);
    arcs.extend_from_slice(&subidentifiers[1..]);

    Some(arcs)
}

// YYYYMMDDHHMMSS[.f{1,9}]Z
fn parse_generalized_time(content: &[u8]) -> Option<DateTime<Utc>> {
    let (body, zone) = content.split_at(content.len().checked_sub(1)?);
    if zone != b"Z" || body.len() < 14 {
        return None;
    }

    let (date_time, fraction) = body.split_at(14);
    if !date_time.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let nanos = match fraction {
        [] => 0,
        [b'.', digits @ ..]
            if (1..=9).contains(&digits.len())
                && digits.iter().all(u8::is_ascii_digit)
                && digits.last() != Some(&b'0') =>
        {
            decimal(digits) * 10u32.pow(9 - digits.len() as u32)
        }
        _ => return None,
    };

    let naive = NaiveDate::from_ymd_opt(
        decimal(&date_time[0..4]) as i32,
        decimal(&date_time[4..6]),
        decimal(&date_time[6..8]),
    )?
    .and_hms_nano_opt(
        decimal(&date_time[8..10]),
        decimal(&date_time[10..12]),
        decimal(&date_time[12..14]),
        nanos,
    )?;

    Some(Utc.from_utc_datetime(&naive))
}

fn decimal(digits: &[u8]) -> u32 {
    digits
        .iter()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}
