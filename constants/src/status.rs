pub const GENERATING: &str = "Generating environment...";
pub const GENERATED: &str = "Environment generated successfully!";
pub const EXPLORING: &str = "Starting exploration...";
pub const EXPLORED: &str = "Exploration completed successfully!";
pub const MAPPING: &str = "Generating map...";
pub const MAPPED: &str = "Map generated successfully!";

/// Prefix distinguishing errors on the single status channel.
pub const ERROR_PREFIX: &str = "Error: ";
