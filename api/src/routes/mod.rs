pub mod ask;
pub mod index;
pub mod status;
