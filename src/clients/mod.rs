//! Clients for the three external stores: documents, blobs and the
//! relational access log.

pub mod document_store;
pub mod object_store;
pub mod relational;
