//! # Referto (RefertoSicuro API client)
//!
//! `referto` is the client-side core of the RefertoSicuro medical-report assistant.
//! It talks to the REST backend with session cookies and keeps the pieces of state a
//! browser client would otherwise hide in module globals as explicit objects.
//!
//! ## CSRF Protection
//!
//! The backend uses the double-submit cookie pattern: a `GET` to the token endpoint
//! sets a cookie and returns the same token in the body, and every state-changing
//! request must echo it in the `X-CSRF-Token` header.
//!
//! - **In-memory only:** the token lives in a [`csrf::CsrfTokenManager`] and is never
//!   written to disk. It is valid for one hour from issuance.
//! - **Lazy refresh:** expiry is checked when a caller asks for the token; there is no
//!   background timer.
//! - **One retry:** a `403` whose `detail` mentions `CSRF` triggers a token refresh and
//!   a single retry of the original request.
//! - **Feature detection:** a `404` from the token endpoint means the deployment has
//!   CSRF protection disabled; requests proceed without the header.
//!
//! ## Session Expiry
//!
//! A `401` outside the login endpoint fires the [`auth_modal::AuthModalSignal`] so the
//! UI layer can prompt for credentials.

pub mod api;
pub mod auth_modal;
pub mod cli;
pub mod csrf;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
