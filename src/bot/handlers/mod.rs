//! Discord interaction handlers

/// Autocomplete handlers for chain names and categories
pub mod autocomplete;
