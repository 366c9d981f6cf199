pub mod alerts;
pub mod auth;
pub mod categories;
pub mod cron;
pub mod health;
pub mod movements;
pub mod notifications;
pub mod products;
pub mod users;
