pub mod auth;
pub mod badges;
pub mod leaderboard;
pub mod notifications;
pub mod root;
pub mod submissions;
pub mod teams;
pub mod users;
