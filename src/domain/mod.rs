// Domain layer - Inspection records, filters and pure aggregation
pub mod aggregation;
pub mod dashboard;
pub mod filter;
pub mod inspection;
pub mod recency;
pub mod search;
