/// Map payload: the center point, marker descriptors and directions links
/// handed to the plot in `ui::map`.

pub mod geo;
pub mod markers;
