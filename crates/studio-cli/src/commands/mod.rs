pub mod export;
pub mod send;
pub mod sessions;
