//! Region boundary model and the grid rasterizer.
//!
//! The rasterizer lays a square lattice over the boundary's bounding box,
//! starting at its minimum corner, and keeps every cell whose centre touches
//! at least one boundary polygon. Kept cells are numbered `bpx_1, bpx_2, ...`
//! in scan order: columns (x) ascending on the outside, rows (y) ascending
//! on the inside.

use geo::{Coord, Intersects, LineString, Polygon, Rect};

use crate::config::validate_cell_size;
use crate::error::{MaskError, Result};

/// Prefix of every kept cell identifier.
pub const ID_PREFIX: &str = "bpx_";

/// A single ring as read from the input: a closed list of `[x, y]` positions.
pub type Ring = Vec<[f64; 2]>;

/// One boundary polygon together with its own bounding rectangle.
#[derive(Debug, Clone)]
struct BoundaryPolygon {
    polygon: Polygon<f64>,
    bounds: Rect<f64>,
}

/// Immutable region boundary in a planar metric CRS.
///
/// Only constructible through [`Boundary::from_rings`], so every instance
/// holds at least one polygon and every ring is closed with 4+ positions.
#[derive(Debug, Clone)]
pub struct Boundary {
    polygons: Vec<BoundaryPolygon>,
    bbox: BoundingBox,
}

impl Boundary {
    /// Builds a boundary from polygons given as rings (outer ring first, then holes).
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::InvalidInput`] if:
    /// - no polygon is given
    /// - a polygon has no rings
    /// - a ring has fewer than 4 positions or is not closed
    pub fn from_rings(polygons: Vec<Vec<Ring>>) -> Result<Self> {
        if polygons.is_empty() {
            return Err(MaskError::InvalidInput(
                "boundary contains no polygons".to_string(),
            ));
        }

        let mut built = Vec::with_capacity(polygons.len());
        for (p, rings) in polygons.into_iter().enumerate() {
            built.push(build_polygon(p, rings)?);
        }

        let bbox = built
            .iter()
            .map(|bp| BoundingBox::from(bp.bounds))
            .reduce(BoundingBox::union)
            .ok_or_else(|| MaskError::InvalidInput("boundary contains no polygons".to_string()))?;

        Ok(Self {
            polygons: built,
            bbox,
        })
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// True if `point` lies inside, or on the edge of, any polygon.
    ///
    /// A point inside a hole is outside that polygon. The result does not
    /// depend on polygon order.
    pub fn touches(&self, point: Coord<f64>) -> bool {
        self.polygons
            .iter()
            .any(|bp| bp.bounds.intersects(&point) && bp.polygon.intersects(&point))
    }
}

fn build_polygon(index: usize, rings: Vec<Ring>) -> Result<BoundaryPolygon> {
    for (r, ring) in rings.iter().enumerate() {
        if ring.len() < 4 {
            return Err(MaskError::InvalidInput(format!(
                "polygon {index} ring {r} has {} positions, need at least 4",
                ring.len()
            )));
        }
        if ring.first() != ring.last() {
            return Err(MaskError::InvalidInput(format!(
                "polygon {index} ring {r} is not closed"
            )));
        }
    }

    let bounds = ring_bounds(&rings);
    let mut rings = rings.into_iter().map(to_line_string);
    let Some(exterior) = rings.next() else {
        return Err(MaskError::InvalidInput(format!("polygon {index} has no rings")));
    };
    let polygon = Polygon::new(exterior, rings.collect());

    Ok(BoundaryPolygon { polygon, bounds })
}

fn to_line_string(ring: Ring) -> LineString<f64> {
    LineString::new(ring.into_iter().map(|[x, y]| Coord { x, y }).collect())
}

fn ring_bounds(rings: &[Ring]) -> Rect<f64> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for [x, y] in rings.iter().flatten().copied() {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}

/// Smallest axis-aligned box containing every boundary coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// `[min_x, min_y, max_x, max_y]`, the GeoJSON `bbox` ordering.
    pub fn to_array(self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

/// A square lattice cell, identified by its lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl GridCell {
    /// Centre of the square: `(x + size/2, y + size/2)`.
    pub fn centroid(&self) -> Coord<f64> {
        let half = self.size / 2.0;
        Coord {
            x: self.x + half,
            y: self.y + half,
        }
    }

    /// Closed counter-clockwise ring starting at the lower-left corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.size, self.y + self.size);
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]
    }
}

/// A grid cell that survived the containment test.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptCell {
    pub id: String,
    pub cell: GridCell,
}

/// Output of [`rasterize`]: kept cells in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskResult {
    pub bbox: BoundingBox,
    pub cell_size: f64,
    /// Number of candidate cells tested.
    pub scanned: usize,
    pub cells: Vec<KeptCell>,
}

/// Rasterizes `boundary` into square cells of side `cell_size`.
///
/// # Errors
///
/// Returns [`MaskError::InvalidConfig`] if `cell_size` is not a positive
/// finite number. Nothing is scanned in that case.
///
/// # Examples
///
/// ```
/// use berlin_pixels_common::grid::{rasterize, Boundary};
///
/// let square = vec![[0.0, 0.0], [1000.0, 0.0], [1000.0, 1000.0], [0.0, 1000.0], [0.0, 0.0]];
/// let boundary = Boundary::from_rings(vec![vec![square]]).unwrap();
/// let mask = rasterize(&boundary, 500.0).unwrap();
/// assert_eq!(mask.cells.len(), 4);
/// assert_eq!(mask.cells[0].id, "bpx_1");
/// ```
pub fn rasterize(boundary: &Boundary, cell_size: f64) -> Result<MaskResult> {
    validate_cell_size(cell_size)?;

    let bbox = boundary.bbox();
    let mut cells = Vec::new();
    let mut scanned = 0usize;

    // Positions come from the lattice index, not a running sum.
    let mut i = 0u64;
    loop {
        let x = bbox.min_x + i as f64 * cell_size;
        if x >= bbox.max_x {
            break;
        }

        let mut j = 0u64;
        loop {
            let y = bbox.min_y + j as f64 * cell_size;
            if y >= bbox.max_y {
                break;
            }

            scanned += 1;
            let cell = GridCell {
                x,
                y,
                size: cell_size,
            };
            if boundary.touches(cell.centroid()) {
                cells.push(KeptCell {
                    id: format!("{ID_PREFIX}{}", cells.len() + 1),
                    cell,
                });
            }
            j += 1;
        }
        i += 1;
    }

    Ok(MaskResult {
        bbox,
        cell_size,
        scanned,
        cells,
    })
}
