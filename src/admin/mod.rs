/// Admin accounts, roles and the activity log
///
/// Handles the superadmin bootstrap, admin account management and the
/// append-only audit trail of administrative actions.
pub mod activity;
pub mod roles;

pub use activity::{ActivityAction, ActivityLogger};
pub use roles::{AdminManager, AdminProfile, Role, SeedOutcome};
