//! Forecast map frame rendering.
//!
//! Implements the drawing side of the plotter:
//! - Discrete-level colormaps and the scheme registry
//! - Local extrema detection and value-label selection
//! - Contour lines (marching squares) with inline labels
//! - A retained-mode canvas with colorbars and text
//! - PNG export
//! - `FrameRenderer`, which draws one time step at a time onto a reused canvas

pub mod canvas;
pub mod colorbar;
pub mod colormap;
pub mod contour;
pub mod extrema;
pub mod frame;
pub mod glyphs;
pub mod labels;
pub mod layout;
pub mod png;

pub use canvas::{ArtifactId, ArtifactKind, Canvas};
pub use colormap::{Color, Extend, LevelColormap, LevelSet, Normalizer, SchemeDefinition, SchemeRegistry};
pub use extrema::{ExtremaFinder, ExtremumKind, ExtremumPoint, TieBreak};
pub use frame::{frame_file_name, DrawnArtifactSet, FrameRenderer, SurfaceSpec, SurfaceState};
pub use labels::{ValueLabel, ValueLabeler, ValuePredicate};
pub use layout::{Layout, LevelSpec, ResolvedLayout};
