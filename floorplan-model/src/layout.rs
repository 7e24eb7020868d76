use crate::geometry::{GeometryError, Polygon};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Symbol categories, kept in lockstep with the detection model's names
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Column,
    CurtainWall,
    Dimension,
    Door,
    Railing,
    SlidingDoor,
    Stairs,
    Wall,
    Window,
}

impl Category {
    /// Map a detector class name to a category, case-insensitively.
    /// Unrecognized classes fall back to `Wall`.
    pub fn from_class_name(name: &str) -> Category {
        match name.to_lowercase().as_str() {
            "column" => Category::Column,
            "curtain wall" => Category::Wall,
            "dimension" => Category::Dimension,
            "door" => Category::Door,
            "railing" => Category::Railing,
            "sliding door" => Category::Door,
            "stair case" => Category::Stairs,
            "wall" => Category::Wall,
            "window" => Category::Window,
            _ => Category::Wall,
        }
    }

    /// A room "has a door" when it holds either a plain or a sliding
    /// door symbol.
    pub fn counts_as_door(&self) -> bool {
        matches!(self, Category::Door | Category::SlidingDoor)
    }
}

/// A detected architectural element with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    category: Category,
    bbox: Polygon,
}

impl Symbol {
    /// The bbox must be a 4-point ring with all corners distinct;
    /// anything else is a malformed detection and fails construction.
    pub fn new(category: Category, bbox: Polygon) -> Result<Self, GeometryError> {
        let points = bbox.points();
        let distinct = points
            .iter()
            .enumerate()
            .all(|(i, p)| points[i + 1..].iter().all(|q| q != p));
        if points.len() != 4 || !distinct {
            return Err(GeometryError::BadSymbolBox(points.len()));
        }
        Ok(Self { category, bbox })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn bbox(&self) -> &Polygon {
        &self.bbox
    }
}

/// Free-form text recovered by OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
}

/// Width and height of a room in feet, recovered from OCR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metadata {
    Label(Label),
    Dimension(Dimension),
}

/// One enclosed area of the floor plan. The polygon is fixed at
/// construction; symbols and metadata accumulate during the annotation
/// stages.
#[derive(Debug, Clone)]
pub struct Room {
    polygon: Polygon,
    symbols: Vec<Arc<Symbol>>,
    metadata: Vec<Metadata>,
}

impl Room {
    pub fn new(polygon: Polygon) -> Self {
        Self {
            polygon,
            symbols: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn symbols(&self) -> &[Arc<Symbol>] {
        &self.symbols
    }

    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Append a symbol, keeping insertion order. The same symbol
    /// identity is never stored twice in one room.
    pub fn add_symbol(&mut self, symbol: Arc<Symbol>) {
        if !self.symbols.iter().any(|s| Arc::ptr_eq(s, &symbol)) {
            self.symbols.push(symbol);
        }
    }

    pub fn add_metadata(&mut self, metadata: Metadata) {
        self.metadata.push(metadata);
    }

    /// Room name derived from its OCR labels, in order of appearance.
    pub fn name(&self) -> String {
        let labels: Vec<&str> = self
            .metadata
            .iter()
            .filter_map(|m| match m {
                Metadata::Label(label) => Some(label.text.as_str()),
                Metadata::Dimension(_) => None,
            })
            .collect();
        labels.join(" ")
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        self.metadata
            .iter()
            .filter_map(|m| match m {
                Metadata::Dimension(d) => Some(*d),
                Metadata::Label(_) => None,
            })
            .collect()
    }

    /// The first dimension found is authoritative when a single value is
    /// needed.
    pub fn first_dimension(&self) -> Option<Dimension> {
        self.dimensions().into_iter().next()
    }
}

/// The full geometric + annotation model of one floor plan: all rooms
/// plus annotations that no room claimed.
#[derive(Debug, Clone)]
pub struct Layout {
    rooms: Vec<Room>,
    metadata: Vec<Metadata>,
    file_name: String,
}

impl Layout {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            rooms: Vec::new(),
            metadata: Vec::new(),
            file_name: file_name.into(),
        }
    }

    pub fn with_rooms(file_name: impl Into<String>, rooms: Vec<Room>) -> Self {
        Self {
            rooms,
            metadata: Vec::new(),
            file_name: file_name.into(),
        }
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Annotations whose centroid landed in no room, e.g. exterior
    /// dimension callouts.
    pub fn add_metadata(&mut self, metadata: Metadata) {
        self.metadata.push(metadata);
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn door_symbol() -> Arc<Symbol> {
        let bbox = Polygon::axis_aligned(1.0, 1.0, 2.0, 2.0).unwrap();
        Arc::new(Symbol::new(Category::Door, bbox).unwrap())
    }

    fn square_room() -> Room {
        Room::new(
            Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(5.0, 5.0),
                Point::new(0.0, 5.0),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn class_name_mapping() {
        assert_eq!(Category::from_class_name("door"), Category::Door);
        assert_eq!(Category::from_class_name("Sliding Door"), Category::Door);
        assert_eq!(Category::from_class_name("CURTAIN WALL"), Category::Wall);
        assert_eq!(Category::from_class_name("stair case"), Category::Stairs);
        // Unknown classes fall back to Wall
        assert_eq!(Category::from_class_name("elevator"), Category::Wall);
    }

    #[test]
    fn sliding_door_counts_as_door() {
        assert!(Category::Door.counts_as_door());
        assert!(Category::SlidingDoor.counts_as_door());
        assert!(!Category::Window.counts_as_door());
    }

    #[test]
    fn symbol_rejects_degenerate_bbox() {
        // Zero-width box collapses to 2 distinct corners
        let flat = Polygon::axis_aligned(1.0, 1.0, 1.0, 5.0).unwrap();
        assert!(matches!(
            Symbol::new(Category::Door, flat),
            Err(GeometryError::BadSymbolBox(_))
        ));
    }

    #[test]
    fn symbol_rejects_non_quad() {
        let tri = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ])
        .unwrap();
        assert!(Symbol::new(Category::Door, tri).is_err());
    }

    #[test]
    fn room_deduplicates_symbols_by_identity() {
        let mut room = square_room();
        let door = door_symbol();
        room.add_symbol(Arc::clone(&door));
        room.add_symbol(Arc::clone(&door));
        assert_eq!(room.symbols().len(), 1);

        // An equal but distinct symbol is a separate entry
        let other = door_symbol();
        room.add_symbol(other);
        assert_eq!(room.symbols().len(), 2);
    }

    #[test]
    fn shared_symbol_is_one_identity_across_rooms() {
        let mut a = square_room();
        let mut b = square_room();
        let door = door_symbol();
        a.add_symbol(Arc::clone(&door));
        b.add_symbol(Arc::clone(&door));
        assert!(Arc::ptr_eq(&a.symbols()[0], &b.symbols()[0]));
    }

    #[test]
    fn room_name_joins_labels_in_order() {
        let mut room = square_room();
        room.add_metadata(Metadata::Label(Label {
            text: "Master".to_string(),
        }));
        room.add_metadata(Metadata::Dimension(Dimension {
            width: 12.0,
            height: 10.0,
        }));
        room.add_metadata(Metadata::Label(Label {
            text: "Bedroom".to_string(),
        }));
        assert_eq!(room.name(), "Master Bedroom");
    }

    #[test]
    fn first_dimension_is_authoritative() {
        let mut room = square_room();
        room.add_metadata(Metadata::Dimension(Dimension {
            width: 12.0,
            height: 10.0,
        }));
        room.add_metadata(Metadata::Dimension(Dimension {
            width: 3.0,
            height: 3.0,
        }));
        assert_eq!(room.dimensions().len(), 2);
        let first = room.first_dimension().unwrap();
        assert_eq!(first.width, 12.0);
        assert_eq!(first.height, 10.0);
    }
}
