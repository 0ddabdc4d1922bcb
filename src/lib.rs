//! Strict DER decoding of RFC 3161 TSTInfo structures.
//!
//! ```no_run
//! let bytes = std::fs::read("tstinfo.der").unwrap();
//! let tst_info = tstinfo::decode(&bytes).unwrap();
//!
//! println!("{}", tst_info.gen_time());
//! ```

pub mod asn1_types;
pub mod errors;
pub mod reader;
pub mod token;
pub mod tstinfo;
pub mod utils;
pub use der;

pub use asn1_types::{AlgorithmIdentifier, HashAlgorithm, Oid};
pub use errors::{TstInfoError, TstInfoErrorKind};
pub use tstinfo::{Accuracy, Extension, Extensions, MessageImprint, TstInfo};

/// Decodes one DER-encoded TSTInfo.
///
/// Any deviation from the grammar, including trailing bytes, is an error. The
/// caller should treat an error as "no valid timestamp".
pub fn decode(bytes: &[u8]) -> Result<TstInfo, TstInfoError> {
    TstInfo::from_der(bytes)
}
