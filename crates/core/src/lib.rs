//! Domain types and pure logic for the dino color collection tracker.
//!
//! Nothing in this crate performs I/O. The remote store client and the
//! state managers build on these types.

pub mod alias;
pub mod collection;
pub mod colors;
pub mod error;
pub mod ids;
pub mod master_list;
pub mod share;
pub mod types;
pub mod upload;
