// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading of [OpenStreetMap](https://www.openstreetmap.org/) data into a [Graph].
//!
//! Every node is loaded with its `name` tag. Ways with a routable `highway` tag
//! (see [Options::highways]) are converted into bidirectional [Edges](crate::Edge), with
//! costs equal to the crow-flies distance between consecutive nodes. Afterwards, nodes
//! which are neither a part of any routable way, nor have a name, are removed.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use graph_builder::GraphBuilder;

use crate::Graph;

mod graph_builder;
mod model;
mod xml;

/// Values of the [highway tag](https://wiki.openstreetmap.org/wiki/Key:highway)
/// of ways used by default to build the street graph.
pub const DEFAULT_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "living_street",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
];

/// Error which can occur when loading OSM data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file from its first few bytes.
    /// Anything which isn't gzip or bzip2 compressed is assumed to be XML.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1F, 0x8B]) {
            Self::XmlGz
        } else if head.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for interpreting OSM data as a [Graph].
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    /// Values of the `highway` tag of ways which should be converted into edges.
    pub highways: &'a [&'a str],

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter features by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f64; 4],
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            highways: DEFAULT_HIGHWAYS,
            file_format: FileFormat::Unknown,
            bbox: [0.0; 4],
        }
    }
}

/// Parse OSM features from a reader into a [Graph] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn add_features_from_io<'a, R: io::Read>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    reader: R,
) -> Result<(), Error> {
    let mut b = io::BufReader::new(reader);
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        known => known,
    };
    log::debug!("reading OSM data as {:?}", file_format);

    match file_format {
        FileFormat::Unknown | FileFormat::Xml => {
            let r = xml::Reader::from_io(b);
            GraphBuilder::new(g, options).add_features(r)?;
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(g, options).add_features(r)?;
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(g, options).add_features(r)?;
        }
    }

    Ok(())
}

/// Parse OSM features from a file at the provided path into a [Graph] as per the provided [Options].
pub fn add_features_from_file<'a, P: AsRef<Path>>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    path: P,
) -> Result<(), Error> {
    let f = File::open(path)?;
    add_features_from_io(g, options, f)
}

/// Parse OSM features from a static buffer into a [Graph] as per the provided [Options].
pub fn add_features_from_buffer<'a>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    data: &[u8],
) -> Result<(), Error> {
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        known => known,
    };

    if file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        let r = xml::Reader::from_buffer(data);
        GraphBuilder::new(g, options).add_features(r)?;
        Ok(())
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        add_features_from_io(g, options, cursor)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{StreetMap, DEFAULT_TIMEOUT};

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    macro_rules! assert_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_finite());
        };
    }

    macro_rules! assert_no_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_infinite());
        };
    }

    const DATA: &[u8] = include_bytes!("test_fixtures/simple.osm");

    fn gzipped(data: &[u8]) -> Vec<u8> {
        let mut e = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn bzipped(data: &[u8]) -> Vec<u8> {
        let mut e = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn load(data: &[u8], file_format: FileFormat) -> Graph {
        let mut g = Graph::default();
        let options = Options {
            file_format,
            ..Default::default()
        };
        add_features_from_buffer(&mut g, &options, data).unwrap();
        g
    }

    fn check_simple_graph(g: &Graph) {
        // 1 ── 2 ── 3
        // │         │
        // 4 ── 5 ── 6 ·· 7 (footway)
        //
        // 8, 9: named locations, 10: unused

        // Check the loaded nodes
        assert_eq!(g.len(), 8);
        assert!(g.get_node(-7).is_none());
        assert!(g.get_node(-10).is_none());
        assert_eq!(
            g.get_node(-2).and_then(|n| n.name.as_deref()),
            Some("Shattuck & Center"),
        );
        assert_eq!(g.get_node(-8).and_then(|n| n.name.as_deref()), Some("Top Dog"));
        assert_eq!(g.get_node(-1).and_then(|n| n.name.as_deref()), None);

        // Check edge costs
        assert_almost_eq!(g.get_edge(-1, -4), 0.2224);
        assert_eq!(g.get_edge(-1, -4), g.get_edge(-4, -1));

        // Check edges
        for (a, b) in [(-1, -2), (-2, -3), (-4, -5), (-5, -6), (-1, -4), (-3, -6)] {
            assert_edge!(g, a, b);
            assert_edge!(g, b, a);
        }
        assert_no_edge!(g, -1, -3);
        assert_no_edge!(g, -6, -7);
        assert!(!g.has_neighbors(-8));
        assert!(!g.has_neighbors(-9));
    }

    #[test]
    fn test_build_graph_xml() {
        check_simple_graph(&load(DATA, FileFormat::Xml));
    }

    #[test]
    fn test_build_graph_xml_io() {
        let mut g = Graph::default();
        let options = Options {
            file_format: FileFormat::Xml,
            ..Default::default()
        };
        add_features_from_io(&mut g, &options, io::Cursor::new(DATA)).unwrap();
        check_simple_graph(&g);
    }

    #[test]
    fn test_build_graph_gz() {
        check_simple_graph(&load(&gzipped(DATA), FileFormat::XmlGz));
    }

    #[test]
    fn test_build_graph_bz2() {
        check_simple_graph(&load(&bzipped(DATA), FileFormat::XmlBz2));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(FileFormat::detect(DATA), FileFormat::Xml);
        assert_eq!(FileFormat::detect(&gzipped(DATA)), FileFormat::XmlGz);
        assert_eq!(FileFormat::detect(&bzipped(DATA)), FileFormat::XmlBz2);

        check_simple_graph(&load(DATA, FileFormat::Unknown));
        check_simple_graph(&load(&gzipped(DATA), FileFormat::Unknown));
        check_simple_graph(&load(&bzipped(DATA), FileFormat::Unknown));

        let mut g = Graph::default();
        add_features_from_io(&mut g, &Options::default(), io::Cursor::new(bzipped(DATA))).unwrap();
        check_simple_graph(&g);
    }

    #[test]
    fn test_bbox() {
        let mut g = Graph::default();
        let options = Options {
            file_format: FileFormat::Xml,
            bbox: [-122.2705, 37.8675, -122.2675, 37.8705],
            ..Default::default()
        };
        add_features_from_buffer(&mut g, &options, DATA).unwrap();

        let mut ids: Vec<_> = g.iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![-9, -5, -4, -2, -1]);
        assert_edge!(g, -1, -2);
        assert_edge!(g, -4, -5);
        assert_no_edge!(g, -2, -3);
    }

    #[test]
    fn test_custom_highways() {
        let mut g = Graph::default();
        let options = Options {
            highways: &["footway"],
            file_format: FileFormat::Xml,
            ..Default::default()
        };
        add_features_from_buffer(&mut g, &options, DATA).unwrap();

        assert_edge!(g, -6, -7);
        assert_no_edge!(g, -1, -2);
        assert!(g.get_node(-1).is_none());
        assert!(g.get_node(-2).is_some());
    }

    #[test]
    fn test_invalid_xml() {
        let mut g = Graph::default();
        let options = Options {
            file_format: FileFormat::Xml,
            ..Default::default()
        };
        let err = add_features_from_buffer(&mut g, &options, b"<osm><node id='1'></way></osm>");
        assert!(matches!(err, Err(Error::Xml(_))));
    }

    #[test]
    fn test_missing_file() {
        let mut g = Graph::default();
        let err = add_features_from_file(&mut g, &Options::default(), "does/not/exist.osm");
        assert!(matches!(err, Err(Error::Io(_))));
    }

    #[test]
    fn test_street_map() {
        let m = StreetMap::new(load(DATA, FileFormat::Xml));

        // Closest to the isolated "Top Dog" (-8) is the routable -6
        assert_eq!(m.closest(-122.2580, 37.8675), Some(-6));
        assert_eq!(m.closest(-122.2699, 37.8699), Some(-1));

        let mut names = m.search_by_prefix("to");
        names.sort();
        assert_eq!(names, vec!["Top Dog", "Top Dog"]);

        let ids: Vec<_> = m.search_exact("TOP DOG").iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![-9, -8]);
        assert!(m.search_exact("shattuck center").is_empty());
        assert_eq!(m.search_exact("shattuck  center").len(), 1);

        let route = m.route(-1, -6, DEFAULT_TIMEOUT);
        assert!(route.is_solved());
        assert_eq!(route.path.len(), 4);
    }
}
