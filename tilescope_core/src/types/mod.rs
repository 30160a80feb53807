//! Contains coordinates, bounding boxes, quadkeys, projections and request limits.

mod geo_bbox;
pub use geo_bbox::*;

mod limits;
pub use limits::*;

mod projection;
pub use projection::*;

mod quadkey;
pub use quadkey::*;

mod tile_bbox;
pub use tile_bbox::*;

mod tile_coord;
pub use tile_coord::*;
