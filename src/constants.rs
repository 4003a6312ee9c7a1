/// Largest page a client may request from a capped connection (`bills`, `people`).
pub const MAX_PAGE_SIZE: usize = 100;

/// Bills shown per page on the server-rendered bill list.
pub const BILLS_PER_PAGE: usize = 20;

/// Number of bills published in a state's RSS feed.
pub const FEED_SIZE: usize = 100;

pub const DEFAULT_SITE_URL: &str = "https://openstates.org";
pub const DEFAULT_DATABASE_PATH: &str = "data/openstates.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONFIG_PATH: &str = "openstates.toml";

// Party bucket for votes cast by people we could not match
pub const UNKNOWN_PARTY: &str = "Unknown";

// Action classifications
pub const ACTION_PASSAGE: &str = "passage";
pub const ACTION_SIGNATURE: &str = "executive-signature";
pub const ACTION_VETO: &str = "executive-veto";
pub const ACTION_BECAME_LAW: &str = "became-law";

// Organization classifications
pub const CHAMBER_UPPER: &str = "upper";
pub const CHAMBER_LOWER: &str = "lower";
pub const LEGISLATURE: &str = "legislature";
pub const PARTY: &str = "party";
