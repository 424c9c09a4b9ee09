//! Repository layer: one struct of associated query functions per table.

pub mod frame_repo;

pub use frame_repo::FrameRepo;
