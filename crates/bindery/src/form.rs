//! Form body parsing.
//!
//! Both `application/x-www-form-urlencoded` and `multipart/form-data`
//! bodies normalize into a [`SourceMap`]. Multipart file parts are ignored;
//! only text fields contribute values.

use std::io;

use bytes::Bytes;
use futures::executor::block_on;
use tracing::trace;

use crate::error::{BindError, BodyFormat};
use crate::source::SourceMap;

/// Parses an urlencoded body.
#[must_use]
pub fn parse_urlencoded(body: &[u8]) -> SourceMap {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
    pairs.into_iter().collect()
}

/// Parses a multipart body into its text fields.
///
/// The boundary is read from `content_type`. At most `max_fields` parts are
/// read, file parts included.
pub fn parse_multipart(
    content_type: &str,
    body: Bytes,
    max_fields: usize,
) -> Result<SourceMap, BindError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|err| BindError::malformed(BodyFormat::Multipart, err))?;

    let stream = futures::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    block_on(async move {
        let mut source = SourceMap::new();
        let mut count = 0_usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| BindError::malformed(BodyFormat::Multipart, err))?
        {
            count += 1;
            if count > max_fields {
                return Err(BindError::malformed(
                    BodyFormat::Multipart,
                    format!("too many fields (max {max_fields})"),
                ));
            }

            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if field.file_name().is_some() {
                trace!(field = name.as_str(), "skipping multipart file part");
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|err| BindError::malformed(BodyFormat::Multipart, err))?;
            source.append(name, value);
        }

        Ok(source)
    })
}
