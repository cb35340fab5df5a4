pub mod agent;
pub mod decoding;
pub mod wallet;

pub use agent::{Agent, WalletParams, FAILED_AGENT_SCORE};
pub use decoding::DecodingMode;
pub use wallet::{check_prices, Wallet};
