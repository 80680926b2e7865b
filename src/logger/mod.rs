//! Activity logging: typed page events written as append-only JSONL with graceful degradation.

pub mod activity;
pub mod jsonl;
