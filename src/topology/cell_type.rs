//! Shape tags for mesh elements.
//!
//! A [`CellType`] is what a functor receives as the element's shape; it fixes
//! how many adjacency ids to expect for fixed-arity shapes. The integer codes
//! are stable so functors may switch on them.

use serde::{Deserialize, Serialize};

/// Common cell types for mesh elements.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 0D vertex.
    #[default]
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
    /// 2D polygon with `n` vertices.
    Polygon(u8),
    /// Generic polyhedron.
    Polyhedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral | CellType::Polygon(_) => 2,
            CellType::Tetrahedron
            | CellType::Hexahedron
            | CellType::Prism
            | CellType::Pyramid
            | CellType::Polyhedron => 3,
        }
    }

    /// Number of corner nodes, for shapes whose arity is fixed.
    ///
    /// `Polyhedron` returns `None`: its node list length is free.
    pub fn vertex_count(self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Segment => Some(2),
            CellType::Triangle => Some(3),
            CellType::Quadrilateral | CellType::Tetrahedron => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Prism => Some(6),
            CellType::Hexahedron => Some(8),
            CellType::Polygon(n) => Some(usize::from(n)),
            CellType::Polyhedron => None,
        }
    }

    /// Stable integer code of the shape.
    pub fn code(self) -> i32 {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 5,
            CellType::Pyramid => 6,
            CellType::Prism => 7,
            CellType::Hexahedron => 8,
            CellType::Polygon(_) => 9,
            CellType::Polyhedron => 10,
        }
    }

    /// Inverse of [`code`](Self::code). Polygons need their vertex count.
    pub fn from_code(code: i32, vertices: usize) -> Option<Self> {
        Some(match code {
            1 => CellType::Vertex,
            2 => CellType::Segment,
            3 => CellType::Triangle,
            4 => CellType::Quadrilateral,
            5 => CellType::Tetrahedron,
            6 => CellType::Pyramid,
            7 => CellType::Prism,
            8 => CellType::Hexahedron,
            9 => CellType::Polygon(u8::try_from(vertices).ok()?),
            10 => CellType::Polyhedron,
            _ => return None,
        })
    }
}
