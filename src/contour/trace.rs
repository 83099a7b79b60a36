use super::region::{Point, Region};
use crate::segmentation::Mask;
use ndarray::Array2;

/// Moore neighbourhood, clockwise from east (y grows downwards)
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),   // 0: east
    (1, 1),   // 1: south-east
    (0, 1),   // 2: south
    (-1, 1),  // 3: south-west
    (-1, 0),  // 4: west
    (-1, -1), // 5: north-west
    (0, -1),  // 6: north
    (1, -1),  // 7: north-east
];

/// Where the sweep starts on the first pixel of a component. Raster order
/// guarantees its west and north neighbours are background.
const INITIAL_SEARCH: usize = 6;

/// Find every connected foreground region with `min_area <= area <= max_area`
///
/// Regions are returned in raster discovery order (top-to-bottom, then
/// left-to-right by their first pixel). Area is the component's pixel count.
pub fn find_regions(mask: &Mask, min_area: u32, max_area: u32) -> Vec<Region> {
    find_regions_limited(mask, min_area, max_area, usize::MAX)
}

/// `find_regions` that stops after `max_regions` accepted regions
pub fn find_regions_limited(
    mask: &Mask,
    min_area: u32,
    max_area: u32,
    max_regions: usize,
) -> Vec<Region> {
    let _span = tracing::debug_span!("find_regions").entered();

    let (width, height) = mask.dimensions();
    let mut labelled = Array2::<bool>::from_elem((height as usize, width as usize), false);
    let mut regions = Vec::new();
    let mut rejected = 0usize;

    'scan: for y in 0..height {
        for x in 0..width {
            if labelled[[y as usize, x as usize]] || !mask.is_set(x, y) {
                continue;
            }

            let start = Point::new(x as i32, y as i32);
            let area = label_component(mask, &mut labelled, start);

            if area < min_area || area > max_area {
                rejected += 1;
                continue;
            }

            let outline = trace_boundary(mask, start, area);
            if let Some(region) = Region::new(outline, area) {
                regions.push(region);
            }

            if regions.len() >= max_regions {
                tracing::debug!("Region cap of {} reached", max_regions);
                break 'scan;
            }
        }
    }

    tracing::debug!(
        "Found {} regions ({} outside {}..={})",
        regions.len(),
        rejected,
        min_area,
        max_area
    );

    regions
}

fn is_foreground(mask: &Mask, p: Point) -> bool {
    p.x >= 0 && p.y >= 0 && mask.is_set(p.x as u32, p.y as u32)
}

/// Flood-fill the 8-connected component containing `start`, returning its size
fn label_component(mask: &Mask, labelled: &mut Array2<bool>, start: Point) -> u32 {
    let mut stack = vec![start];
    labelled[[start.y as usize, start.x as usize]] = true;
    let mut area = 0u32;

    while let Some(current) = stack.pop() {
        area += 1;

        for &step in &NEIGHBOURS {
            let next = current.offset(step);
            if is_foreground(mask, next) && !labelled[[next.y as usize, next.x as usize]] {
                labelled[[next.y as usize, next.x as usize]] = true;
                stack.push(next);
            }
        }
    }

    area
}

/// First foreground neighbour of `p`, sweeping clockwise from `from`
fn next_direction(mask: &Mask, p: Point, from: usize) -> Option<usize> {
    (0..8)
        .map(|i| (from + i) % 8)
        .find(|&dir| is_foreground(mask, p.offset(NEIGHBOURS[dir])))
}

/// Trace the outer boundary clockwise with a Moore radial sweep
///
/// Stops when the tracer is back on `start` and about to repeat its first
/// move (Jacob's criterion), so pixels the outline passes through twice are
/// handled. Every boundary pixel is kept.
fn trace_boundary(mask: &Mask, start: Point, area: u32) -> Vec<Point> {
    let mut outline = vec![start];
    let mut current = start;
    let mut search_from = INITIAL_SEARCH;
    let mut first_move = None;

    // Each pixel is entered at most four times
    let max_steps = 4 * area as usize + 8;

    for _ in 0..max_steps {
        let Some(dir) = next_direction(mask, current, search_from) else {
            // Isolated pixel
            break;
        };

        if current == start {
            match first_move {
                None => first_move = Some(dir),
                Some(first) if first == dir => break,
                Some(_) => {}
            }
        }

        current = current.offset(NEIGHBOURS[dir]);
        outline.push(current);
        // Resume one step clockwise past the pixel we came from
        search_from = (dir + 5) % 8;
    }

    // The loop closes by re-entering `start`
    if outline.len() > 1 && outline.last() == Some(&start) {
        outline.pop();
    }

    outline
}
