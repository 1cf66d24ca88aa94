//! Completion over the published candidate vocabulary.
//!
//! - `matcher` : pure prefix matching against one [`CandidateSet`].
//! - `engine`  : snapshot publication, connect/disconnect and background refresh.
crate::reexport!(matcher);
crate::reexport!(engine);
crate::reexport!(engine_tests, test);
