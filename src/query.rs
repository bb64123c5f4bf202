//! Green-space query construction.
//!
//! Turns a route's bounding box into a [`GreenSpaceQuery`]: the OSM tag filters that
//! count as "green", scoped to the box. The query is plain data; rendering it as
//! Overpass QL is provided for the HTTP client but nothing here performs I/O.

use std::fmt;

use crate::{AnalysisError, BoundingBox};

/// Default server-side timeout requested in the Overpass query header.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 25;

/// An OSM `key=value` tag filter that marks an area as green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GreenCategory {
    pub key: &'static str,
    pub value: &'static str,
}

impl GreenCategory {
    pub const PARK: Self = Self { key: "leisure", value: "park" };
    pub const WOOD: Self = Self { key: "natural", value: "wood" };
    pub const FOREST: Self = Self { key: "landuse", value: "forest" };
    pub const GRASS: Self = Self { key: "landuse", value: "grass" };
    pub const MEADOW: Self = Self { key: "landuse", value: "meadow" };
    pub const GARDEN: Self = Self { key: "leisure", value: "garden" };
    pub const SCRUB: Self = Self { key: "natural", value: "scrub" };

    /// Every category counted as green, in query order.
    pub const ALL: [Self; 7] = [
        Self::PARK,
        Self::WOOD,
        Self::FOREST,
        Self::GRASS,
        Self::MEADOW,
        Self::GARDEN,
        Self::SCRUB,
    ];
}

impl fmt::Display for GreenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// A request for green-space polygons inside a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct GreenSpaceQuery {
    pub bounding_box: BoundingBox,
    pub categories: Vec<GreenCategory>,
    pub timeout_secs: u32,
}

impl GreenSpaceQuery {
    /// Render as an Overpass QL query returning way geometries.
    ///
    /// ```rust
    /// use green_exposure::{BoundingBox, build_green_space_query};
    ///
    /// let bbox = BoundingBox { south: 51.49, west: -0.14, north: 51.52, east: -0.11 };
    /// let ql = build_green_space_query(&bbox).unwrap().to_overpass_ql();
    /// assert!(ql.starts_with("[out:json][timeout:25];"));
    /// assert!(ql.contains(r#"way["leisure"="park"](51.49,-0.14,51.52,-0.11);"#));
    /// assert!(ql.ends_with("out geom;"));
    /// ```
    pub fn to_overpass_ql(&self) -> String {
        let b = &self.bounding_box;
        let area = format!("({},{},{},{})", b.south, b.west, b.north, b.east);

        let mut ql = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);
        for category in &self.categories {
            ql.push_str(&format!(
                "  way[\"{}\"=\"{}\"]{};\n",
                category.key, category.value, area
            ));
        }
        ql.push_str(");\nout geom;");
        ql
    }
}

/// Build the green-space query for `bbox` with the default timeout.
///
/// Fails with [`AnalysisError::InvalidBoundingBox`] if the box is out of range or
/// has no area.
pub fn build_green_space_query(bbox: &BoundingBox) -> Result<GreenSpaceQuery, AnalysisError> {
    build_green_space_query_with_timeout(bbox, DEFAULT_QUERY_TIMEOUT_SECS)
}

/// Build the green-space query for `bbox` with an explicit server timeout.
pub fn build_green_space_query_with_timeout(
    bbox: &BoundingBox,
    timeout_secs: u32,
) -> Result<GreenSpaceQuery, AnalysisError> {
    bbox.validate()?;

    Ok(GreenSpaceQuery {
        bounding_box: *bbox,
        categories: GreenCategory::ALL.to_vec(),
        timeout_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london_box() -> BoundingBox {
        BoundingBox { south: 51.49, west: -0.14, north: 51.52, east: -0.11 }
    }

    #[test]
    fn test_query_has_all_green_categories() {
        let query = build_green_space_query(&london_box()).unwrap();
        assert_eq!(query.categories.len(), 7);
        assert!(query.categories.contains(&GreenCategory::PARK));
        assert!(query.categories.contains(&GreenCategory::SCRUB));
        assert_eq!(query.timeout_secs, DEFAULT_QUERY_TIMEOUT_SECS);
        assert_eq!(query.bounding_box, london_box());
    }

    #[test]
    fn test_overpass_ql_text() {
        let query = build_green_space_query(&london_box()).unwrap();
        let expected = "[out:json][timeout:25];\n(\n\
            \x20 way[\"leisure\"=\"park\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"natural\"=\"wood\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"landuse\"=\"forest\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"landuse\"=\"grass\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"landuse\"=\"meadow\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"leisure\"=\"garden\"](51.49,-0.14,51.52,-0.11);\n\
            \x20 way[\"natural\"=\"scrub\"](51.49,-0.14,51.52,-0.11);\n\
            );\nout geom;";
        assert_eq!(query.to_overpass_ql(), expected);
    }

    #[test]
    fn test_custom_timeout() {
        let query = build_green_space_query_with_timeout(&london_box(), 60).unwrap();
        assert!(query.to_overpass_ql().starts_with("[out:json][timeout:60];"));
    }

    #[test]
    fn test_invalid_box_rejected() {
        let inverted = BoundingBox { south: 51.52, west: -0.14, north: 51.49, east: -0.11 };
        assert_eq!(
            build_green_space_query(&inverted),
            Err(AnalysisError::InvalidBoundingBox(inverted))
        );

        let out_of_range = BoundingBox { south: 89.5, west: 0.0, north: 90.01, east: 1.0 };
        assert!(build_green_space_query(&out_of_range).is_err());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(GreenCategory::MEADOW.to_string(), "landuse=meadow");
    }
}
