//! 基础设施层
//!
//! 持有运行期间共享的稀缺资源，只暴露能力。

pub mod clock;
pub mod token_manager;

pub use clock::{Clock, SystemClock};
pub use token_manager::{Credential, TokenManager};
