//! Schedule events extracted from documents: validation, classification
//! and dedupe keys.

pub mod classify;
pub mod dedupe;
pub mod models;
pub mod normalize;

pub use classify::is_common;
pub use dedupe::compute_dedupe_key;
pub use models::{EventFailure, InsertionBatch, ScheduleEvent};
pub use normalize::{locate_json_array, normalize_response, normalize_value, NormalizeOutcome};
