//! Conversion routing tables.
//!
//! A routing table maps a (source, target) format pair onto a conversion
//! operation and lists, per source, the targets offered to the user. The
//! two views are declared separately and checked against each other when
//! the table is built, so a mismatch is caught at startup instead of
//! surfacing in a conversation.

mod table;

pub use table::{RoutingError, RoutingTable, RoutingTableBuilder};
