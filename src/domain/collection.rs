use super::ResolvedLocation;

/// Ordered list of locations resolved during one session.
///
/// Insertion order is preserved and duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationCollection {
    locations: Vec<ResolvedLocation>,
}

impl LocationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, location: ResolvedLocation) {
        self.locations.push(location);
    }

    pub fn clear(&mut self) {
        self.locations.clear();
    }

    pub fn all(&self) -> &[ResolvedLocation] {
        &self.locations
    }

    pub fn first(&self) -> Option<&ResolvedLocation> {
        self.locations.first()
    }

    /// Most recently appended location
    pub fn last(&self) -> Option<&ResolvedLocation> {
        self.locations.last()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
