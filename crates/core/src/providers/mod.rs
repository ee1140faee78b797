pub mod traits;

// Model implementations
pub mod remote;
