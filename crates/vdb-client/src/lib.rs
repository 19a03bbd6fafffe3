//! vdb-client: Client SDK for VerityDB
//!
//! Provides a high-level API for applications to interact with VerityDB:
//! - VerityClient::connect(addr)
//! - publish(tenant, stream, payloads, opts) -> Offsets
//! - Durability options: LocalQuorum, GeoDurable

// TODO: Implement client SDK
