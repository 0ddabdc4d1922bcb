use cms::{content_info::ContentInfo, signed_data::SignedData};
use der::{oid::db::rfc5911::ID_SIGNED_DATA, Decode, Tag, Tagged};

use crate::{
    asn1_types::ID_CT_TST_INFO,
    errors::{TstInfoError, TstInfoErrorKind, TstInfoResult},
    tstinfo::TstInfo,
};

/// Returns the DER TSTInfo carried as eContent of a TimeStampToken.
///
/// The token's signature and certificates are left untouched.
pub fn extract_tst_info(token: &[u8]) -> Result<Vec<u8>, TstInfoError> {
    let ci = ContentInfo::from_der(token).map_app_err(TstInfoErrorKind::InvalidContentInfo)?;

    if ci.content_type != ID_SIGNED_DATA {
        return Err(TstInfoError::new(
            TstInfoErrorKind::InvalidContentType,
            ci.content_type.to_string(),
        ));
    }

    let signed_data = ci
        .content
        .decode_as::<SignedData>()
        .map_app_err(TstInfoErrorKind::InvalidSignedData)?;

    let encap_content_info = signed_data.encap_content_info;
    if encap_content_info.econtent_type != ID_CT_TST_INFO {
        return Err(TstInfoError::new(
            TstInfoErrorKind::InvalidEncapsulatedContentType,
            encap_content_info.econtent_type.to_string(),
        ));
    }

    let econtent = encap_content_info
        .econtent
        .ok_or_else(|| TstInfoError::new(TstInfoErrorKind::EmptyEncapsulatedContent, ""))?;
    if econtent.tag() != Tag::OctetString {
        return Err(TstInfoError::new(
            TstInfoErrorKind::EmptyEncapsulatedContent,
            format!("eContent tagged {}", econtent.tag()),
        ));
    }

    Ok(econtent.value().to_vec())
}

impl TstInfo {
    /// Decodes the TSTInfo inside a DER TimeStampToken (a CMS ContentInfo
    /// wrapping SignedData).
    pub fn from_timestamp_token(token: &[u8]) -> Result<Self, TstInfoError> {
        Self::from_der(&extract_tst_info(token)?)
    }
}
