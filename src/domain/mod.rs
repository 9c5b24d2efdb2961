mod account;
mod money;
mod movement;
mod quiz;
mod rules;
mod session;
mod validation;

pub use account::*;
pub use money::*;
pub use movement::*;
pub use quiz::*;
pub use rules::*;
pub use session::*;
pub use validation::*;
