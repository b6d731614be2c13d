mod referral;

pub use referral::*;
