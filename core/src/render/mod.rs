pub mod density;
pub mod display;
pub mod raster;
pub mod renderer;
pub mod surface;

pub use density::{heat_color, DensityGrid, HeatCell, CELL_SIZE};
pub use display::{DisplayList, DrawCommand};
pub use raster::RasterSurface;
pub use renderer::{RenderRequest, RenderStyle, Renderer};
pub use surface::{Color, DrawSurface, Rect, SurfaceError};
