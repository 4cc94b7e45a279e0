//! # Event Impact Workspace
//!
//! Umbrella crate over the workspace members.
//!
//! ```
//! use event_impact_workspace::impact_math::{apply_effect, EffectShape};
//!
//! let value = apply_effect(200.0, 0.25, 3.0, EffectShape::Immediate);
//! assert_eq!(value, 250.0);
//! ```

pub use event_impact;
pub use impact_math;
