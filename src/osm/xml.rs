// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::model;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader streams OSM [Features](model::Feature) from an
/// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) document.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => match parse_node(&start) {
                        Some(n) => return Some(Ok(model::Feature::Node(n))),
                        None => log::warn!("skipping malformed <node>"),
                    },
                    // "way" can't be self-closing
                    b"tag" => {
                        if let Some(tags) = feature_tags(&mut f) {
                            if let Some((k, v)) = parse_tag(&start) {
                                tags.insert(k, v);
                            }
                        }
                    }
                    b"nd" => {
                        if let Some(nodes) = feature_nodes(&mut f) {
                            if let Some(ref_) = parse_nd(&start) {
                                nodes.push(ref_);
                            }
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => {
                        f = parse_node(&start).map(model::Feature::Node);
                        if f.is_none() {
                            log::warn!("skipping malformed <node>");
                        }
                    }
                    b"way" => {
                        f = parse_way(&start).map(model::Feature::Way);
                        if f.is_none() {
                            log::warn!("skipping malformed <way>");
                        }
                    }
                    // Children of other elements (e.g. relations) must not
                    // be attached to the previous feature
                    _ => f = None,
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

fn parse_id(start: &BytesStart<'_>, key: &[u8]) -> Option<i64> {
    start
        .attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| from_utf8(&attr.value).ok()?.parse().ok())
        .filter(|&id| id != 0)
}

fn parse_node(start: &BytesStart<'_>) -> Option<model::Node> {
    let mut id: i64 = 0;
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lat" => lat = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lon" => lon = from_utf8(&attr.value).ok()?.parse().ok()?,
            _ => {}
        }
    }

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(model::Node {
            id,
            lat,
            lon,
            tags: HashMap::default(),
        })
    } else {
        None
    }
}

fn parse_way(start: &BytesStart<'_>) -> Option<model::Way> {
    parse_id(start, b"id").map(|id| model::Way {
        id,
        nodes: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = attr.unescape_value().ok().map(|s| s.into_owned()),
            b"v" => v = attr.unescape_value().ok().map(|s| s.into_owned()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}

fn parse_nd(start: &BytesStart<'_>) -> Option<i64> {
    parse_id(start, b"ref")
}

fn feature_tags(f: &mut Option<model::Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        None => None,
        Some(model::Feature::Node(ref mut n)) => Some(&mut n.tags),
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.tags),
    }
}

fn feature_nodes(f: &mut Option<model::Feature>) -> Option<&mut Vec<i64>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::model::{Feature, Node, Way};
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const SIMPLE_XML: &[u8] = include_bytes!("test_fixtures/simple.osm");

    fn get_expected_nodes() -> Vec<Node> {
        let node = |id, lat, lon, tags| Node { id, lat, lon, tags };
        vec![
            node(-1, 37.8700, -122.2700, tags! {}),
            node(
                -2,
                37.8700,
                -122.2680,
                tags! {"highway": "traffic_signals", "name": "Shattuck & Center"},
            ),
            node(-3, 37.8700, -122.2660, tags! {}),
            node(-4, 37.8680, -122.2700, tags! {}),
            node(-5, 37.8680, -122.2680, tags! {}),
            node(-6, 37.8680, -122.2660, tags! {}),
            node(-7, 37.8690, -122.2650, tags! {}),
            node(
                -8,
                37.8675,
                -122.2580,
                tags! {"amenity": "restaurant", "name": "Top Dog"},
            ),
            node(-9, 37.8682, -122.2678, tags! {"name": "Top Dog"}),
            node(-10, 37.9000, -122.2000, tags! {}),
        ]
    }

    fn get_expected_ways() -> Vec<Way> {
        vec![
            Way {
                id: -100,
                nodes: vec![-1, -2, -3],
                tags: tags! {"highway": "residential", "name": "Center Street"},
            },
            Way {
                id: -101,
                nodes: vec![-4, -5, -6],
                tags: tags! {"highway": "primary"},
            },
            Way {
                id: -102,
                nodes: vec![-1, -4],
                tags: tags! {"highway": "tertiary_link"},
            },
            Way {
                id: -103,
                nodes: vec![-3, -6],
                tags: tags! {"highway": "secondary"},
            },
            Way {
                id: -104,
                nodes: vec![-6, -7],
                tags: tags! {"highway": "footway"},
            },
        ]
    }

    fn collect_all<I>(features: I) -> Result<(Vec<Node>, Vec<Way>), quick_xml::Error>
    where
        I: Iterator<Item = Result<Feature, quick_xml::Error>>,
    {
        let mut nodes = Vec::default();
        let mut ways = Vec::default();

        for f in features {
            match f? {
                Feature::Node(n) => nodes.push(n),
                Feature::Way(w) => ways.push(w),
            }
        }

        Ok((nodes, ways))
    }

    fn check_against_expected<I>(features: I) -> Result<(), quick_xml::Error>
    where
        I: Iterator<Item = Result<Feature, quick_xml::Error>>,
    {
        let (nodes, ways) = collect_all(features)?;
        assert_eq!(nodes, get_expected_nodes());
        assert_eq!(ways, get_expected_ways());
        Ok(())
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        check_against_expected(Reader::from_buffer(SIMPLE_XML))
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        check_against_expected(Reader::from_io(io::Cursor::new(SIMPLE_XML)))
    }

    #[test]
    fn skips_malformed_elements() -> Result<(), quick_xml::Error> {
        const DATA: &[u8] = br#"<osm>
            <node id="1" lat="1.0" />
            <node id="x" lat="1.0" lon="2.0" />
            <node id="2" lat="1.5" lon="2.5"><tag k="name" v="Ok" /></node>
            <way><nd ref="2" /><tag k="highway" v="primary" /></way>
            <way id="10"><nd ref="0" /><nd ref="2" /><tag k="highway" v="primary" /></way>
        </osm>"#;

        let (nodes, ways) = collect_all(Reader::from_buffer(DATA))?;
        assert_eq!(
            nodes,
            vec![Node {
                id: 2,
                lat: 1.5,
                lon: 2.5,
                tags: tags! {"name": "Ok"},
            }]
        );
        assert_eq!(
            ways,
            vec![Way {
                id: 10,
                nodes: vec![2],
                tags: tags! {"highway": "primary"},
            }]
        );
        Ok(())
    }
}
