//! Coordination between the relational assignment table and the bucket that
//! holds each assignment's JSON payload. The two stores share no transaction:
//! records may reference missing objects and objects may exist without a
//! record, and both are valid states.

mod coordinator;
mod join;
mod keys;
mod payload;

pub use coordinator::{AssignmentCoordinator, Timeouts};
pub use join::{join_assignments, AssignmentView};
pub use keys::{AssignmentId, AssignmentIdInput};
pub use payload::{encode_document, read_document};
