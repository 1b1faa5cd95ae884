//! Content-addressed cache fingerprints.
//!
//! A fingerprint is a BLAKE3 digest over the source bytes plus a canonical
//! encoding of every normalized option that affects output bytes. Fields
//! that cannot change the output (request ids, source filenames) are
//! deliberately excluded.

use blake3::Hasher;
use std::fmt;

use crate::options::ConversionOptions;

/// Deterministic digest identifying a unique (input bytes, options) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Lowercase hex form, used as the on-disk entry name.
    pub fn to_hex(self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Derive the cache fingerprint for input bytes and normalized options.
///
/// Stable across process restarts: the option encoding is a fixed-order
/// textual record, never a hash of in-memory layout.
pub fn fingerprint(bytes: &[u8], options: &ConversionOptions) -> Fingerprint {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.update(b"\n");

    let record = format!(
        "q={};l={};w={};h={};f={};m={};e={}",
        options.quality,
        options.lossless as u8,
        options.width.map_or(String::new(), |w| w.to_string()),
        options.height.map_or(String::new(), |h| h.to_string()),
        options.fit,
        options.strip_metadata as u8,
        options.effort,
    );
    hasher.update(record.as_bytes());

    Fingerprint(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingConfig;
    use crate::options::{FitMode, RawOptions};

    fn base_options() -> ConversionOptions {
        ConversionOptions::normalize(&RawOptions::default(), &EncodingConfig::default())
    }

    #[test]
    fn test_same_inputs_same_fingerprint() {
        let opts = base_options();
        let a = fingerprint(b"image bytes", &opts);
        let b = fingerprint(b"image bytes", &opts);
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn test_different_bytes_different_fingerprint() {
        let opts = base_options();
        assert_ne!(
            fingerprint(b"image bytes", &opts),
            fingerprint(b"other bytes", &opts)
        );
    }

    #[test]
    fn test_every_option_field_changes_fingerprint() {
        let bytes = b"image bytes";
        let base = base_options();
        let reference = fingerprint(bytes, &base);

        let variants = [
            ConversionOptions {
                quality: 81,
                ..base.clone()
            },
            ConversionOptions {
                lossless: true,
                ..base.clone()
            },
            ConversionOptions {
                width: Some(640),
                ..base.clone()
            },
            ConversionOptions {
                height: Some(480),
                ..base.clone()
            },
            ConversionOptions {
                fit: FitMode::Inside,
                ..base.clone()
            },
            ConversionOptions {
                strip_metadata: false,
                ..base.clone()
            },
            ConversionOptions {
                effort: 6,
                ..base.clone()
            },
        ];

        for variant in &variants {
            assert_ne!(
                fingerprint(bytes, variant),
                reference,
                "changing {variant:?} must change the fingerprint"
            );
        }
    }

    #[test]
    fn test_width_height_not_confusable() {
        let bytes = b"image bytes";
        let wide = ConversionOptions {
            width: Some(100),
            ..base_options()
        };
        let tall = ConversionOptions {
            height: Some(100),
            ..base_options()
        };
        assert_ne!(fingerprint(bytes, &wide), fingerprint(bytes, &tall));
    }
}
