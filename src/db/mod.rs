pub mod analyses;
pub mod challenges;
pub mod profiles;
pub mod proposals;
