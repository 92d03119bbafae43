pub mod invoice;
pub mod toggl;
