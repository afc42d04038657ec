pub mod consistency;
pub mod error;
pub mod extract;
pub mod pacing;
pub mod render;
pub mod stability;

pub use consistency::{verified_sample, ConsistencyConfig};
pub use error::ScraperError;
pub use extract::{Extractor, PatternExtractor};
pub use pacing::DelayRange;
pub use render::{HttpRenderer, RenderSession, Renderer};
pub use stability::{wait_for_stable_content, StabilityConfig};
