//! User and group repositories over a shared directory connection

pub mod base;
pub mod groups;
pub mod users;

pub use base::DirectoryContext;
pub use groups::GroupsRepo;
pub use users::UserRepo;
