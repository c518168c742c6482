pub mod badge;
pub mod leaderboard;
pub mod level;
pub mod mission;
pub mod notification;
pub mod school;
pub mod team;
pub mod user;

pub use badge::*;
pub use leaderboard::*;
pub use level::*;
pub use mission::*;
pub use notification::*;
pub use school::*;
pub use team::*;
pub use user::*;
