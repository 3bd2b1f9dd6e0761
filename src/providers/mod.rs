//! External data providers. All network I/O lives here, strictly
//! upstream of the scoring pipeline.

pub mod etherscan;

pub use etherscan::EtherscanClient;
