//! Suppression and annotation layers: inline ignores, baseline diffing,
//! documentation dampening, MITRE ATLAS tagging.

pub mod atlas;
pub mod baseline;
pub mod dampening;
pub mod ignore_comments;
