//! Group persistence behind the [`GroupRepository`](crate::settlement::service::GroupRepository) seam.

pub mod memory;
