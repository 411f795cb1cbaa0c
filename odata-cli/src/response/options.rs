//! Per-response protocol options read from headers

use crate::edm::{CodecOptions, MetadataLevel, Version};
use crate::response::headers::{CONTENT_TYPE, ETAG, HeaderLookup, VERSION_HEADERS};

const APPLICATION_JSON: &str = "application/json";

/// Options a response announces about itself, over the configured defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOptions {
    pub version: Version,
    pub metadata: MetadataLevel,
    pub streaming: bool,
    pub ieee754_compatible: bool,
    pub etag: Option<String>,
}

impl ResponseOptions {
    /// Defaults with no response headers applied
    pub fn from_defaults(defaults: &CodecOptions) -> Self {
        Self {
            version: defaults.version,
            metadata: defaults.metadata,
            streaming: false,
            ieee754_compatible: defaults.ieee754_compatible,
            etag: None,
        }
    }

    /// Read content-type parameters, the version header and `ETag`
    pub fn from_headers<H: HeaderLookup + ?Sized>(headers: &H, defaults: &CodecOptions) -> Self {
        let mut options = Self::from_defaults(defaults);

        if let Some(content_type) = headers.header(CONTENT_TYPE) {
            options.apply_content_type(content_type);
        }

        if let Some(raw) = headers.first_header(&VERSION_HEADERS) {
            match Version::parse(raw) {
                Some(version) => options.version = version,
                None => log::warn!("Ignoring unrecognized protocol version header '{}'", raw),
            }
        }

        options.etag = headers.header(ETAG).map(|etag| etag.to_string());
        log::trace!("Response options: {:?}", options);
        options
    }

    /// `application/json;odata.metadata=full;odata.streaming=true;IEEE754Compatible=false`
    ///
    /// The 3.0 spelling `odata=fullmetadata` is accepted too.
    fn apply_content_type(&mut self, content_type: &str) {
        let Some(json_part) = content_type
            .split(',')
            .map(str::trim)
            .find(|part| part.to_ascii_lowercase().starts_with(APPLICATION_JSON))
        else {
            return;
        };

        for parameter in json_part.split(';').skip(1) {
            let Some((key, value)) = parameter.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key.to_ascii_lowercase().as_str() {
                "odata.metadata" | "odata" => match MetadataLevel::parse(value) {
                    Some(level) => self.metadata = level,
                    None => log::debug!("Unknown metadata level '{}'", value),
                },
                "odata.streaming" | "streaming" => {
                    self.streaming = value.eq_ignore_ascii_case("true")
                }
                "ieee754compatible" => self.ieee754_compatible = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }
    }

    /// Codec options for decoding this response's payload
    pub fn codec_options(&self, defaults: &CodecOptions) -> CodecOptions {
        CodecOptions {
            version: self.version,
            metadata: self.metadata,
            ieee754_compatible: self.ieee754_compatible,
            ..*defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_v4_content_type_parameters() {
        let options = ResponseOptions::from_headers(
            &headers(&[
                (
                    "content-type",
                    "application/json;odata.metadata=full;odata.streaming=true;IEEE754Compatible=true",
                ),
                ("OData-Version", "4.0"),
                ("ETag", "W/\"08D1694BF26D2BC9\""),
            ]),
            &CodecOptions::default(),
        );
        assert_eq!(options.version, Version::V4);
        assert_eq!(options.metadata, MetadataLevel::Full);
        assert!(options.streaming);
        assert!(options.ieee754_compatible);
        assert_eq!(options.etag.as_deref(), Some("W/\"08D1694BF26D2BC9\""));
    }

    #[test]
    fn test_v2_version_header_with_semicolon() {
        let options = ResponseOptions::from_headers(
            &headers(&[
                ("Content-Type", "application/json;charset=utf-8"),
                ("DataServiceVersion", "2.0;"),
            ]),
            &CodecOptions::default(),
        );
        assert_eq!(options.version, Version::V2);
        assert_eq!(options.metadata, MetadataLevel::Minimal);
        assert!(!options.streaming);
    }

    #[test]
    fn test_v3_metadata_spelling() {
        let options = ResponseOptions::from_headers(
            &headers(&[("Content-Type", "application/json;odata=nometadata")]),
            &CodecOptions::default(),
        );
        assert_eq!(options.metadata, MetadataLevel::None);
    }

    #[test]
    fn test_defaults_without_headers() {
        let defaults = CodecOptions {
            version: Version::V3,
            ..Default::default()
        };
        let options = ResponseOptions::from_headers(&headers(&[]), &defaults);
        assert_eq!(options, ResponseOptions::from_defaults(&defaults));
        assert_eq!(options.codec_options(&defaults).version, Version::V3);
    }
}
