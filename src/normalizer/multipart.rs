// src/normalizer/multipart.rs
//! multipart/form-data field decoding over an in-memory body

use bytes::Bytes;
use futures::stream;
use multer::Multipart;
use std::convert::Infallible;

/// Boundary token from a `multipart/form-data` content type.
///
/// Parameter names are matched case-insensitively and surrounding quotes are
/// removed, so mis-cased headers from hand-rolled clients still work.
/// Not `multer::parse_boundary`: the media type was already matched by
/// `essence_of`, and this must accept whatever casing got past that check.
pub fn boundary_of(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

/// Decode every named part as text, in body order. Unnamed parts are skipped.
pub async fn decode_text_fields(
    body: Bytes,
    boundary: &str,
) -> Result<Vec<(String, String)>, multer::Error> {
    let body_stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = Multipart::new(body_stream, boundary);

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await?;
        fields.push((name, value));
    }

    Ok(fields)
}
