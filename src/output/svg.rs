// SVG export for previewing extracted and smoothed shapes
// Coordinates are in source pixels

use crate::error::Result;
use crate::shapes::ShapeCollection;
use crate::smoothing::SmoothedPath;
use image::Rgb;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn write_header<W: Write>(out: &mut W, width: u32, height: u32) -> Result<()> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1""#)?;
    writeln!(out, r#"     width="{}" height="{}""#, width, height)?;
    writeln!(out, r#"     viewBox="0 0 {} {}">"#, width, height)?;
    Ok(())
}

fn hex(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Export a collection as filled polygons, in collection order
pub fn write_collection_svg<W: Write>(
    mut out: W,
    shapes: &ShapeCollection,
    width: u32,
    height: u32,
) -> Result<()> {
    write_header(&mut out, width, height)?;

    for (idx, command) in shapes.draw().enumerate() {
        let Some(first) = command.polygon.first() else {
            continue;
        };

        write!(out, r#"  <path id="shape-{}" fill="{}" "#, idx, hex(command.color))?;
        write!(out, r#"d=""#)?;
        write!(out, "M {},{} ", first.x, first.y)?;
        for p in &command.polygon[1..] {
            write!(out, "L {},{} ", p.x, p.y)?;
        }
        writeln!(out, r#"Z" />"#)?;
    }

    writeln!(out, "</svg>")?;
    out.flush()?;
    Ok(())
}

/// Export smoothed paths as filled closed cubic curves
pub fn write_paths_svg<W: Write>(
    mut out: W,
    paths: &[SmoothedPath],
    width: u32,
    height: u32,
) -> Result<()> {
    write_header(&mut out, width, height)?;

    for (idx, path) in paths.iter().enumerate() {
        if path.is_empty() {
            continue;
        }

        write!(out, r#"  <path id="curve-{}" fill="{}" "#, idx, hex(path.color))?;
        write!(out, r#"d=""#)?;
        write!(out, "M {:.3},{:.3} ", path.start.x, path.start.y)?;
        for s in &path.segments {
            write!(
                out,
                "C {:.3},{:.3} {:.3},{:.3} {:.3},{:.3} ",
                s.ctrl1.x, s.ctrl1.y, s.ctrl2.x, s.ctrl2.y, s.to.x, s.to.y
            )?;
        }
        writeln!(out, r#"Z" />"#)?;
    }

    writeln!(out, "</svg>")?;
    out.flush()?;
    Ok(())
}

pub fn save_collection_svg<P: AsRef<Path>>(
    path: P,
    shapes: &ShapeCollection,
    width: u32,
    height: u32,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_collection_svg(BufWriter::new(file), shapes, width, height)?;
    tracing::info!("Exported {} shape(s) to SVG: {}", shapes.len(), path.as_ref().display());
    Ok(())
}

pub fn save_paths_svg<P: AsRef<Path>>(
    path: P,
    paths: &[SmoothedPath],
    width: u32,
    height: u32,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_paths_svg(BufWriter::new(file), paths, width, height)?;
    tracing::info!("Exported {} curve(s) to SVG: {}", paths.len(), path.as_ref().display());
    Ok(())
}
