pub mod auth;
pub mod feedback;
pub mod municipalities;
pub mod notifications;
pub mod subscriptions;
pub mod users;
