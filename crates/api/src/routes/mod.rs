mod deployment;
mod health;
mod presets;

pub use deployment::deployment_router;
pub use health::health_router;
pub use presets::presets_router;
