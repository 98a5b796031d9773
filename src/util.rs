//! Shared utility modules used across Bazaar components.

pub mod levenshtein;
