pub mod abi;
mod action;
mod call;
mod filter_key;
mod multicall;
mod timestamp;

pub use action::*;
pub use call::*;
pub use filter_key::*;
pub use multicall::*;
pub use timestamp::*;
