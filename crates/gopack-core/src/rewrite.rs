//! In-place span patching.
//!
//! Rewrites are expressed as byte-span replacements collected during a
//! single scan and applied against the original bytes by offset, so a
//! statement's position never has to be re-located by content. Bytes
//! outside the patched spans are carried over untouched, valid UTF-8 or
//! not.

use std::ops::Range;

/// A single pending text replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Byte span of the original text to replace.
    pub span: Range<usize>,
    /// Replacement text.
    pub text: String,
}

impl Patch {
    /// Create a patch replacing `span` with `text`.
    #[must_use]
    pub fn new(span: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// Apply patches to `source`, returning the rewritten bytes.
///
/// Spans must be disjoint (the scanner guarantees this for specifier
/// spans); they may be supplied in any order.
#[must_use]
pub fn apply(source: &[u8], mut patches: Vec<Patch>) -> Vec<u8> {
    patches.sort_by_key(|patch| patch.span.start);
    debug_assert!(
        patches
            .windows(2)
            .all(|pair| pair[0].span.end <= pair[1].span.start),
        "patch spans overlap"
    );

    let mut out = Vec::with_capacity(source.len());
    let mut cursor = 0;
    for patch in &patches {
        out.extend_from_slice(&source[cursor..patch.span.start]);
        out.extend_from_slice(patch.text.as_bytes());
        cursor = patch.span.end;
    }
    out.extend_from_slice(&source[cursor..]);
    out
}
