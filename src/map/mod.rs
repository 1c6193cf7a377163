mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::Ring;
pub use projection::Viewport;
pub use renderer::{ChoroplethRenderer, CountryShape, MapLayers};
