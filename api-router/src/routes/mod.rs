pub mod documents;
pub mod interviews;
pub mod knowledge;
pub mod liveness;
pub mod readiness;
