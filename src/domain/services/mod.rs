pub mod billing;
pub mod reconcile;
pub mod slots;
