//! Authentication module for the gateway
//!
//! This module handles credential verification, account registration,
//! token issuance and renewal, and GitHub federated login.

pub mod handlers;
pub mod password;

mod github;
mod service;
mod tokens;

pub use github::{GitHubClient, GitHubProfile};
pub use service::{AuthService, NewUser, GITHUB_USERNAME_PREFIX};
pub use tokens::{Claims, TokenPair, TokenService};
