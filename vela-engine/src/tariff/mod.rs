mod tariff;

pub use tariff::*;
