//! Core types used throughout Parley

pub mod chunk;
pub mod conversation;
pub mod result;
