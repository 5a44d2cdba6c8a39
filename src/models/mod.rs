//! Request and Response models for the operational API
//!
//! DTOs serialized to and from HTTP bodies and query strings.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    BatchGetRequest, BatchItem, BatchSetRequest, InvalidateQuery, PatternQuery, PutRequest,
};
pub use responses::{
    BatchGetResponse, BatchSetResponse, DeleteResponse, ErrorResponse, GetResponse,
    HealthResponse, InvalidateResponse, PatternDeleteResponse, PutResponse, StatsResponse,
};
