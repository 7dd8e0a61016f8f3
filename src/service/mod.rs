pub mod access;
pub mod auth;
pub mod chat;
pub mod comment;
pub mod crypto;
pub mod email;
pub mod event;
pub mod invitation;
pub mod log;
pub mod rsvp;
pub mod user;
pub mod weather;
