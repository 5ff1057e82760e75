//! Image CDN URL rewriting
//!
//! Google-hosted images take their size as a suffix on the URL
//! (`...=s400`, `...=w300-h200`). Rewriting the suffix asks the CDN for a
//! different resolution without another lookup.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::constants::image::{CDN_EXACT_HOSTS, CDN_HOST_SUFFIXES};

lazy_static! {
    static ref SIZE_SUFFIX: Regex = Regex::new(r"=[swh]\d+(?:-[swh]\d+)*(&|$)").unwrap();
}

/// Requested image size: either a square bound or explicit width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeConfig {
    pub size: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Named sizes selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizePreset {
    Thumbnail,
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
    Full,
    Original,
}

impl SizePreset {
    pub const ALL: [SizePreset; 7] = [
        Self::Thumbnail,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::ExtraLarge,
        Self::Full,
        Self::Original,
    ];

    /// Pixel bound; `0` asks for the original resolution
    pub fn pixels(self) -> u32 {
        match self {
            Self::Thumbnail => 150,
            Self::Small => 250,
            Self::Medium => 400,
            Self::Large => 600,
            Self::ExtraLarge => 800,
            Self::Full => 1200,
            Self::Original => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Thumbnail => "THUMBNAIL",
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
            Self::ExtraLarge => "EXTRA_LARGE",
            Self::Full => "FULL",
            Self::Original => "ORIGINAL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SizePreset> for SizeConfig {
    fn from(preset: SizePreset) -> Self {
        SizeConfig::square(preset.pixels())
    }
}

impl SizeConfig {
    pub fn square(size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn dimensions(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            size: None,
            width,
            height,
        }
    }

    /// Resolve a configuration value: a preset name (any case), a positive
    /// pixel count, or anything else as `MEDIUM`.
    pub fn from_setting(value: &str) -> Self {
        if let Some(preset) = SizePreset::from_name(value) {
            return preset.into();
        }
        match value.trim().parse::<u32>() {
            Ok(px) if px > 0 => Self::square(px),
            _ => SizePreset::Medium.into(),
        }
    }

    fn suffix(&self) -> Option<String> {
        if let Some(size) = self.size {
            return Some(format!("=s{size}"));
        }
        let parts: Vec<String> = [("w", self.width), ("h", self.height)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| format!("{key}{v}")))
            .collect();
        (!parts.is_empty()).then(|| format!("={}", parts.join("-")))
    }
}

/// Whether `url` points at a CDN that understands size suffixes
///
/// Protocol-relative URLs (`//host/...`) are read as `https:`.
pub fn is_cdn_url(url: &str) -> bool {
    let parsed = match url.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => Url::parse(url),
    };
    let Ok(parsed) = parsed else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    CDN_HOST_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
        || CDN_EXACT_HOSTS.contains(&host)
}

/// Drop every size suffix from a URL.
pub fn strip_size_suffix(url: &str) -> String {
    SIZE_SUFFIX.replace_all(url, "$1").into_owned()
}

/// Rewrites CDN URLs to a requested size, falling back to a default size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageUrlTransformer {
    default_size: SizeConfig,
}

impl Default for ImageUrlTransformer {
    fn default() -> Self {
        Self::new(SizePreset::Medium.into())
    }
}

impl ImageUrlTransformer {
    pub fn new(default_size: SizeConfig) -> Self {
        Self { default_size }
    }

    pub fn from_setting(value: &str) -> Self {
        Self::new(SizeConfig::from_setting(value))
    }

    pub fn default_size(&self) -> SizeConfig {
        self.default_size
    }

    /// Rewrite the size suffix of a CDN URL; any other URL is returned as is.
    pub fn transform_url(&self, url: &str, size: Option<&SizeConfig>) -> String {
        if !is_cdn_url(url) {
            return url.to_string();
        }

        let base = strip_size_suffix(url);
        let suffix = size
            .and_then(SizeConfig::suffix)
            .or_else(|| self.default_size.suffix())
            .unwrap_or_else(|| format!("=s{}", SizePreset::Medium.pixels()));
        format!("{base}{suffix}")
    }

    /// Rewrite with the default size
    pub fn apply(&self, url: &str) -> String {
        self.transform_url(url, None)
    }
}

/// Rewrite with the built-in `MEDIUM` default
pub fn transform_url(url: &str, size: Option<&SizeConfig>) -> String {
    ImageUrlTransformer::default().transform_url(url, size)
}
