// Application layer - Use cases around the live record stream
pub mod inspection_source;
pub mod live_sync_service;
pub mod poller;

#[cfg(test)]
pub mod testing;
