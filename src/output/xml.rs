use super::OutputSink;
use crate::contour::{Point, Region};
use crate::error::{Result, ShapeError};
use crate::shapes::ShapeCollection;
use image::Rgb;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name for frame `index` of an exported sequence
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:05}.xml", index)
}

/// Serialize a collection as `<shapes><shape><color/><points>...`
pub fn write_shapes<W: Write>(mut out: W, shapes: &ShapeCollection) -> Result<()> {
    writeln!(out, "<shapes>")?;

    for shape in shapes {
        let Rgb([r, g, b]) = shape.color();
        writeln!(out, "    <shape>")?;
        writeln!(out, r#"        <color r="{}" g="{}" b="{}" />"#, r, g, b)?;
        writeln!(out, "        <points>")?;
        for p in shape.region().points() {
            writeln!(
                out,
                r#"            <point x="{:.6}" y="{:.6}" />"#,
                f64::from(p.x),
                f64::from(p.y)
            )?;
        }
        writeln!(out, "        </points>")?;
        writeln!(out, "    </shape>")?;
    }

    writeln!(out, "</shapes>")?;
    out.flush()?;
    Ok(())
}

/// Write a collection to `path`
pub fn save_shapes<P: AsRef<Path>>(path: P, shapes: &ShapeCollection) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_shapes(BufWriter::new(file), shapes)?;
    tracing::debug!("Saved {} shapes to {}", shapes.len(), path.display());
    Ok(())
}

/// Read the first `<shape>` of a shape document
///
/// Later shapes are ignored. A missing `color` element reads as black;
/// point coordinates are rounded to the nearest pixel.
pub fn read_first_shape(document: &str) -> Result<(Region, Rgb<u8>)> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut open: Vec<String> = Vec::new();
    let mut found_root = false;
    let mut found_shape = false;
    let mut found_points = false;
    let mut color = Rgb([0, 0, 0]);
    let mut points = Vec::new();

    loop {
        let (element, is_start) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => {
                let closed = open.pop();
                if closed.as_deref() == Some("shape") && open.len() == 1 {
                    // First shape done
                    break;
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let parents: Vec<&str> = open.iter().map(String::as_str).collect();

        match (parents.as_slice(), name.as_str()) {
            ([], "shapes") => found_root = true,
            (["shapes"], "shape") => {
                found_shape = true;
                if !is_start {
                    // `<shape/>` has no children and is the first shape
                    break;
                }
            }
            (["shapes", "shape"], "color") => {
                color = Rgb([
                    channel(&element, "r")?,
                    channel(&element, "g")?,
                    channel(&element, "b")?,
                ]);
            }
            (["shapes", "shape"], "points") => found_points = true,
            (["shapes", "shape", "points"], "point") => {
                let x: f32 = required(&element, "x")?;
                let y: f32 = required(&element, "y")?;
                points.push(Point::new(x.round() as i32, y.round() as i32));
            }
            _ => {}
        }

        if is_start {
            open.push(name);
        }
    }

    if !found_root {
        return Err(ShapeError::MalformedExportFile("missing <shapes> root".to_string()));
    }
    if !found_shape {
        return Err(ShapeError::MalformedExportFile("no <shape> entries".to_string()));
    }
    if !found_points {
        return Err(ShapeError::MalformedExportFile("first shape has no <points>".to_string()));
    }

    let region = Region::from_polygon(points).ok_or_else(|| {
        ShapeError::MalformedExportFile("first shape has an empty point list".to_string())
    })?;

    Ok((region, color))
}

/// Load the first shape from a file
pub fn load_first_shape<P: AsRef<Path>>(path: P) -> Result<(Region, Rgb<u8>)> {
    let path = path.as_ref();
    tracing::debug!("Loading shape from {}", path.display());
    let document = std::fs::read_to_string(path)?;
    read_first_shape(&document)
}

fn attribute<T: FromStr>(element: &BytesStart<'_>, key: &str) -> Result<Option<T>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() != key.as_bytes() {
            continue;
        }
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
        return value.trim().parse().map(Some).map_err(|_| {
            ShapeError::MalformedExportFile(format!("bad value {:?} for attribute {}", value, key))
        });
    }
    Ok(None)
}

fn required<T: FromStr>(element: &BytesStart<'_>, key: &str) -> Result<T> {
    attribute(element, key)?.ok_or_else(|| {
        ShapeError::MalformedExportFile(format!(
            "<{}> is missing attribute {}",
            String::from_utf8_lossy(element.name().as_ref()),
            key
        ))
    })
}

/// Color channel, 0 when absent, clamped into 0..=255
fn channel(element: &BytesStart<'_>, key: &str) -> Result<u8> {
    let value: f64 = attribute(element, key)?.unwrap_or(0.0);
    Ok(value.round().clamp(0.0, 255.0) as u8)
}

/// Writes each frame's shapes to `frame_00000.xml`, `frame_00001.xml`, ...
pub struct XmlSequenceWriter {
    dir: PathBuf,
    written: usize,
}

impl XmlSequenceWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        tracing::info!("Writing shape frames to {}", dir.display());
        Ok(Self { dir, written: 0 })
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(frame_file_name(index))
    }

    /// Number of frame files written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl OutputSink for XmlSequenceWriter {
    fn write_frame(&mut self, index: usize, shapes: &ShapeCollection) -> Result<()> {
        save_shapes(self.path_for(index), shapes)?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn sample_collection() -> ShapeCollection {
        let first = Region::from_polygon(vec![
            Point::new(40, 40),
            Point::new(59, 40),
            Point::new(59, 59),
            Point::new(40, 59),
        ])
        .unwrap();
        let second = Region::from_polygon(vec![Point::new(1, 2), Point::new(3, 4)]).unwrap();

        vec![
            Shape::new(first, Rgb([255, 0, 0])),
            Shape::new(second, Rgb([0, 128, 255])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(frame_file_name(0), "frame_00000.xml");
        assert_eq!(frame_file_name(123), "frame_00123.xml");
    }

    #[test]
    fn test_write_format() {
        let mut out = Vec::new();
        write_shapes(&mut out, &sample_collection()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("<shapes>\n    <shape>\n"));
        assert!(text.contains(r#"<color r="255" g="0" b="0" />"#));
        assert!(text.contains(r#"<point x="40.000000" y="59.000000" />"#));
        assert_eq!(text.matches("<shape>").count(), 2);
    }

    #[test]
    fn test_round_trip_first_shape() {
        let collection = sample_collection();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shapes.xml");

        save_shapes(&path, &collection).unwrap();
        let (region, color) = load_first_shape(&path).unwrap();

        assert_eq!(color, Rgb([255, 0, 0]));
        assert_eq!(region.points(), collection.shapes()[0].region().points());
        assert_eq!(region.bounding_box(), collection.shapes()[0].region().bounding_box());
    }

    #[test]
    fn test_reads_fractional_points_and_defaults() {
        let document = r#"
            <shapes>
                <shape>
                    <points>
                        <point x="1.4" y="2.6"/>
                        <point x="10" y="2"></point>
                    </points>
                </shape>
                <shape>
                    <color r="1" g="1" b="1"/>
                    <points><point x="99" y="99"/></points>
                </shape>
            </shapes>"#;
        let (region, color) = read_first_shape(document).unwrap();

        assert_eq!(color, Rgb([0, 0, 0]));
        assert_eq!(region.points(), &[Point::new(1, 3), Point::new(10, 2)]);
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "<shape><points><point x=\"1\" y=\"1\"/></points></shape>",
            "<shapes></shapes>",
            "<shapes><shape><color r=\"1\" g=\"2\" b=\"3\"/></shape></shapes>",
            "<shapes><shape><points></points></shape></shapes>",
            "<shapes><shape/><shape><points><point x=\"5\" y=\"5\"/></points></shape></shapes>",
            "<shapes><shape><points><point x=\"a\" y=\"1\"/></points></shape></shapes>",
            "<shapes><shape><points><point y=\"1\"/></points></shape></shapes>",
        ];

        for document in cases {
            assert!(
                matches!(read_first_shape(document), Err(ShapeError::MalformedExportFile(_))),
                "expected a malformed-file error for {}",
                document
            );
        }
    }

    #[test]
    fn test_sequence_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XmlSequenceWriter::new(dir.path().join("frames")).unwrap();

        writer.write_frame(0, &ShapeCollection::default()).unwrap();
        writer.write_frame(1, &sample_collection()).unwrap();

        assert_eq!(writer.written(), 2);
        assert!(dir.path().join("frames/frame_00000.xml").is_file());
        let (_, color) = load_first_shape(dir.path().join("frames/frame_00001.xml")).unwrap();
        assert_eq!(color, Rgb([255, 0, 0]));
    }
}
