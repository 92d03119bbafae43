pub mod aggregate;
pub mod in_memory;
pub mod pdf;
pub mod toggl;
