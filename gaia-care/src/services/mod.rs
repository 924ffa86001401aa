//! Domain operations
//!
//! Every subject-scoped operation takes the calling caregiver's id
//! explicitly and authorizes through [`access::authorize`] before it
//! validates input or touches storage.

pub mod access;
pub mod aggregation;
pub mod alerts;
pub mod identity;
pub mod ledger;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;
