//! Image reference classification.
//!
//! An image stored in a report is a plain string whose prefix says where the
//! pixels live. [`ImageRef::classify`] turns that string into a tagged value
//! once, so the rest of the crate matches on [`ImageRefKind`] instead of
//! re-testing prefixes.

use std::fmt;

/// Prefix of inline images (data URIs).
pub const INLINE_PREFIX: &str = "data:";

/// Scheme marker of references into the legacy image store.
pub const LEGACY_SCHEME: &str = "rtdb://";

/// Storage tier an image reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRefKind {
    /// Empty or whitespace-only. Never rendered.
    Empty,
    /// Self-contained data URI.
    Inline,
    /// Anything not positively identified as inline or legacy, normally an
    /// HTTP(S) blob-store URL. Passed through as already displayable.
    Remote,
    /// `rtdb://<key>`; needs a lookup in the legacy store.
    Legacy,
}

impl ImageRefKind {
    /// Classify a reference string by its prefix.
    pub fn of(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Empty
        } else if raw.starts_with(INLINE_PREFIX) {
            Self::Inline
        } else if raw.starts_with(LEGACY_SCHEME) {
            Self::Legacy
        } else {
            Self::Remote
        }
    }
}

impl fmt::Display for ImageRefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Inline => write!(f, "inline"),
            Self::Remote => write!(f, "remote"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// A classified image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    raw: String,
    kind: ImageRefKind,
}

impl ImageRef {
    /// Classify `raw`.
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = ImageRefKind::of(&raw);
        Self { raw, kind }
    }

    /// Build a legacy reference for a store key.
    pub fn legacy(key: &str) -> Self {
        Self::classify(format!("{LEGACY_SCHEME}{key}"))
    }

    pub fn kind(&self) -> ImageRefKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    /// The legacy store key, for [`ImageRefKind::Legacy`] references.
    pub fn legacy_key(&self) -> Option<&str> {
        match self.kind {
            ImageRefKind::Legacy => self.raw.strip_prefix(LEGACY_SCHEME),
            _ => None,
        }
    }

    /// Whether the reference can be handed to a renderer as-is.
    pub fn is_renderable(&self) -> bool {
        matches!(self.kind, ImageRefKind::Inline | ImageRefKind::Remote)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
