//! Patch schema-tag versioning and compatibility.

/// Canonical schema tag for weekly-review patch documents.
pub const PATCH_SCHEMA_TAG: &str = "thesis.weekly_review.patch.v1";

/// Underscored spelling emitted by an older generation of patch producers.
/// Accepted as an alias of [`PATCH_SCHEMA_TAG`], not a separate schema.
pub const PATCH_SCHEMA_TAG_LEGACY: &str = "thesis_weekly_review_patch_v1";

/// Check whether a patch schema tag is accepted.
///
/// Comparison is case-insensitive and tolerates both the dotted and the
/// underscored spelling.
pub fn is_accepted_patch_schema(tag: &str) -> bool {
    let tag = tag.trim().to_ascii_lowercase();
    tag == PATCH_SCHEMA_TAG || tag == PATCH_SCHEMA_TAG_LEGACY
}
