//! End-to-end scenarios against the public tree API.
//!
//! Each test file covers one scenario, using deterministic inputs (fixed
//! sequences or seeded shuffles).

#![cfg(test)]

mod helpers;

mod test_chain_integrity;
mod test_clear;
mod test_cursor_removal;
mod test_duplicate_insert;
mod test_floor_lookup;
mod test_interval_set;
mod test_random_million;
mod test_sequential;
