//! vdb-directory: Placement routing for VerityDB
//!
//! The directory determines which VSR group handles a given stream
//! based on its placement policy (regional PHI vs global non-PHI).
//!
//! Key function: group_for_stream(stream_metadata) -> GroupId

// TODO: Implement placement router
