pub mod analysis;
pub mod role;
pub mod team;
pub mod user;

pub use analysis::DocumentAnalysis;
pub use role::RoleDefinition;
pub use team::{Team, TeamMember};
pub use user::User;
