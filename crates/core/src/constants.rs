/// Lifetime allocated books needed for each donor badge tier.
pub const BADGE_BRONZE_THRESHOLD: u64 = 10;
pub const BADGE_SILVER_THRESHOLD: u64 = 50;
pub const BADGE_GOLD_THRESHOLD: u64 = 100;

/// Default drop-off instructions shown on a new drive.
pub const DEFAULT_DRIVE_INSTRUCTIONS: &str =
    "Only non-academic books can be donated. Drop time for books is between 9 AM & 7 PM.";

/// Message returned to clients for fatal allocation failures.
pub const GENERIC_ALLOCATION_FAILURE: &str = "Server error during book allocation";
