//! Conversion options: lenient raw input and the normalized form.
//!
//! Normalization is total — malformed or missing fields fall back to
//! documented defaults instead of being rejected. This is the only place
//! defaults are applied; everything downstream consumes the normalized
//! struct.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::EncodingConfig;

/// Resize fit policy, mirroring the five accepted modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the target box exactly, cropping overflow
    #[default]
    Cover,
    /// Letterbox onto the target box without cropping
    Contain,
    /// Stretch to the target box ignoring aspect ratio
    Fill,
    /// Shrink to fit within the target box, preserving aspect ratio
    Inside,
    /// Shrink so the target box is fully covered, without cropping
    Outside,
}

impl FromStr for FitMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "contain" => Ok(Self::Contain),
            "fill" => Ok(Self::Fill),
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::Inside => "inside",
            Self::Outside => "outside",
        };
        f.write_str(s)
    }
}

/// Raw, caller-supplied options before normalization.
///
/// Deserialization is lenient: query-string values arrive as strings, and
/// any value that fails to parse becomes `None` rather than an error, so a
/// request with `quality=abc` still converts with the default quality.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOptions {
    #[serde(deserialize_with = "lenient_int")]
    pub quality: Option<i64>,

    #[serde(deserialize_with = "lenient_bool")]
    pub lossless: Option<bool>,

    #[serde(deserialize_with = "lenient_uint")]
    pub width: Option<u32>,

    #[serde(deserialize_with = "lenient_uint")]
    pub height: Option<u32>,

    pub fit: Option<String>,

    #[serde(alias = "stripMetadata", deserialize_with = "lenient_bool")]
    pub strip_metadata: Option<bool>,
}

/// Fully-normalized conversion options.
///
/// Invariants: `quality` is in [1,100], `effort` in [0,6], `width`/`height`
/// are positive when present, `fit` is always one of the five modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub quality: u8,
    pub lossless: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    pub strip_metadata: bool,
    /// Process-wide encoder effort; carried here so it reaches both the
    /// encoder and the cache fingerprint.
    pub effort: u8,
}

impl ConversionOptions {
    /// Normalize raw options against explicit defaults. Pure and total.
    pub fn normalize(raw: &RawOptions, defaults: &EncodingConfig) -> Self {
        let quality = raw
            .quality
            .unwrap_or(i64::from(defaults.quality))
            .clamp(1, 100) as u8;

        Self {
            quality,
            lossless: raw.lossless.unwrap_or(defaults.lossless),
            width: raw.width.filter(|w| *w > 0),
            height: raw.height.filter(|h| *h > 0),
            fit: raw
                .fit
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            strip_metadata: raw.strip_metadata.unwrap_or(defaults.strip_metadata),
            effort: defaults.effort.min(6),
        }
    }

    /// Whether a resize was requested at all.
    pub fn resize_requested(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Loosely-typed scalar as it may arrive from a query string or JSON body.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient_int<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Scalar>::deserialize(de)?;
    Ok(match value {
        Some(Scalar::Int(n)) => Some(n),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_uint<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    let value = lenient_int(de)?;
    Ok(value.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0))
}

fn lenient_bool<'de, D: Deserializer<'de>>(de: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Scalar>::deserialize(de)?;
    Ok(match value {
        Some(Scalar::Bool(b)) => Some(b),
        Some(Scalar::Int(n)) => Some(n != 0),
        Some(Scalar::Text(s)) => parse_truthy(&s),
        None => None,
    })
}

/// Truthy/falsy coercion for query-string booleans.
fn parse_truthy(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
