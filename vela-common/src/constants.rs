/// The smallest coin unit count in one whole coin.
pub const MINOR_UNITS_PER_COIN: u64 = 1_000_000;

/// Human-readable part of account addresses.
pub const ACCOUNT_ADDRESS_HRP: &str = "vela";

/// Human-readable part of consensus addresses.
pub const CONSENSUS_ADDRESS_HRP: &str = "velavalcons";

/// Human-readable part of consensus public keys.
pub const CONSENSUS_PUBLIC_KEY_HRP: &str = "velavalconspub";

pub const NANOS_IN_A_SECOND: i64 = 1_000_000_000;
pub const NANOS_IN_A_MINUTE: i64 = 60 * NANOS_IN_A_SECOND;
pub const NANOS_IN_AN_HOUR: i64 = 60 * NANOS_IN_A_MINUTE;
pub const NANOS_IN_A_DAY: i64 = 24 * NANOS_IN_AN_HOUR;

/// Amount of coins, in minor units.
pub type Amount = u64;
