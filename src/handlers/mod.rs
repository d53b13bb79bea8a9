// Two-tier handler architecture:
// Public (no auth, /auth/* and liveness) -> Protected (JWT auth, /api/*)
pub mod public;
pub mod protected;
