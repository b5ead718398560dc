//! Authored text → [`SectionMap`].
//!
//! Two dialects are accepted: the `<<section>>` format ([`parse_sections`])
//! and the legacy tag format ([`parse_legacy`]). Both produce the same
//! section map, which [`crate::ProblemDefinition::from_sections`] turns into a
//! definition.

#[path = "grammar/cleanup.rs"]
mod cleanup;
#[path = "grammar/legacy.rs"]
mod legacy;
#[path = "grammar/raw_value.rs"]
mod raw_value;
#[path = "grammar/sections.rs"]
mod sections;

pub use legacy::parse_legacy;
pub use raw_value::RawValue;
pub use sections::{SectionMap, SectionValue, parse_sections};
