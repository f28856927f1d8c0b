//! Remembered-login support.
//!
//! The password for the last used email can be kept in the OS keychain and
//! offered as a pre-fill on the login form. Strictly optional; no flow
//! requires it.

pub mod credentials;

pub use credentials::CredentialStore;
