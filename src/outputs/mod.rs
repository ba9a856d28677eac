//! Output generation.
//!
//! # Submodules
//!
//! - [`html`]: Renders the static dashboard page with the embedded dataset and
//!   the client-side news assistant
//!
//! # Output Structure
//!
//! ```text
//! index.html          # dashboard, regenerated on every run
//! news_cache.json     # extracted bodies, see crate::cache
//! ```

pub mod html;
