//! vdb-server: Cap'n Proto RPC server for VerityDB
//!
//! Exposes the VerityDB API over Cap'n Proto RPC:
//! - create_stream()
//! - publish()
//! - subscribe()
//! - query projections

// TODO: Implement RPC server
