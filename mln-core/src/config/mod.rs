mod grounding_config;

pub use grounding_config::GroundingConfig;
