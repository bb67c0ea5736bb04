//! HTTP collaborator for the FujiNet network device.
//!
//! The device layer depends only on the [`HttpClient`] trait. Two
//! implementations ship here:
//!
//! - [`ReqwestHttpClient`] for real traffic
//! - [`MockHttpClient`] for scripted tests
//!
//! [`AnyHttpClient`] selects between them at runtime.

pub mod any;
pub mod client;
pub mod error;
pub mod mock;
pub mod reqwest_client;

pub use any::AnyHttpClient;
pub use client::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use error::{ClientError, Result};
pub use mock::MockHttpClient;
pub use reqwest_client::ReqwestHttpClient;
