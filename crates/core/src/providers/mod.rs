pub mod traits;

// Collaborator implementations
pub mod http;
