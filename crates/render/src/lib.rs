//! Report image rendering for SteamWrap
//!
//! - `layout`: first pass, sizes and positions
//! - `renderer`: second pass, draws a `Report` onto a tiny-skia surface
//! - `image_loader`: avatar and icon fetching with fallbacks
//! - `exporter`: PNG bytes and data URLs

pub mod canvas;
pub mod exporter;
pub mod image_loader;
pub mod layout;
pub mod renderer;
pub mod style;
pub mod text;

pub use exporter::{encode_png, report_file_name, to_data_url};
pub use image_loader::{FetchError, FetchedBytes, HttpFetcher, ImageFetcher, ImageLoader, LoadTier, LoadedImage};
pub use layout::LayoutPlan;
pub use renderer::ReportRenderer;
pub use style::RenderOptions;
pub use text::FontBook;
