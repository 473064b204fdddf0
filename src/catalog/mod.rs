//! Metadata catalog access.
//!
//! Authenticated search and lookup against the external catalog that owns
//! the authoritative artist, track, album, artwork and ISRC data.

mod client;
mod error;
mod models;
mod token;

pub use client::{CatalogApi, CatalogClient};
pub use error::CatalogError;
pub use models::{CatalogAlbum, CatalogImage, CatalogToken, CatalogTrack};
pub use token::{StaticTokenSource, TokenCache, TokenSource, REFRESH_MARGIN_SECS};
