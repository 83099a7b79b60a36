use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use image::Rgb;
use shapetrace::frame::{pick_color, FrameSource, ImageSequence, PixelBuffer};
use shapetrace::output::{
    load_first_shape, save_collection_svg, save_paths_svg, save_shapes, XmlSequenceWriter,
};
use shapetrace::pipeline::{run_pipeline, AreaLimit, ExtractConfig, FramePipeline};
use shapetrace::segmentation::create_classifier;
use shapetrace::smoothing::{smooth, DEFAULT_SMOOTHING};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract shapes of one color from a still image
    Still {
        /// Input image
        image: PathBuf,

        /// Take the reference color from this pixel (X,Y)
        #[arg(long, value_parser = parse_coord, conflicts_with = "color", required_unless_present = "color")]
        pick: Option<(u32, u32)>,

        /// Reference color (R,G,B)
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb<u8>>,

        /// Color distance threshold
        #[arg(long, default_value_t = 20)]
        threshold: u32,

        /// Smallest region kept, in pixels
        #[arg(long, default_value_t = 5)]
        min_area: u32,

        /// Largest region kept, in pixels (defaults to the image area)
        #[arg(long)]
        max_area: Option<u32>,

        /// XML file for the extracted shapes
        #[arg(short, long, default_value = "shapes.xml")]
        output: PathBuf,

        /// Also write an SVG preview
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Save the refined mask as a grayscale image
        #[arg(long)]
        save_mask: Option<PathBuf>,
    },

    /// Track one color through a directory of frames
    Track {
        /// Directory of frame images, processed in name order
        frames: PathBuf,

        /// Reference color (R,G,B)
        #[arg(long, value_parser = parse_rgb)]
        color: Rgb<u8>,

        /// Color distance threshold
        #[arg(long, default_value_t = 13)]
        threshold: u32,

        /// Smallest region kept, in pixels
        #[arg(long, default_value_t = 5)]
        min_area: u32,

        /// Largest region kept, in pixels (defaults to the frame area)
        #[arg(long)]
        max_area: Option<u32>,

        /// Directory for the per-frame XML files
        #[arg(short, long, default_value = "frames")]
        output_dir: PathBuf,
    },

    /// Extract regions that changed between consecutive frames
    ///
    /// Output file N belongs to input frame N. The first frame has nothing
    /// to compare against, so `frame_00000.xml` is always empty.
    Motion {
        /// Directory of frame images, processed in name order
        frames: PathBuf,

        /// Per-pixel brightness change threshold
        #[arg(long, default_value_t = 35)]
        threshold: u32,

        /// Smallest region kept, in pixels
        #[arg(long, default_value_t = 5)]
        min_area: u32,

        /// Largest region kept, in pixels (defaults to 1/25 of the frame area)
        #[arg(long)]
        max_area: Option<u32>,

        /// Directory for the per-frame XML files
        #[arg(short, long, default_value = "frames")]
        output_dir: PathBuf,
    },

    /// Fit a smooth curve through the first shape of an XML file
    Smooth {
        /// Shape file written by `still`, `track` or `motion`
        input: PathBuf,

        /// Smoothing coefficient (0 keeps the polygon)
        #[arg(long, default_value_t = DEFAULT_SMOOTHING)]
        coefficient: f32,

        /// SVG file for the curve
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

fn parse_rgb(s: &str) -> std::result::Result<Rgb<u8>, String> {
    let channels = s
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid color {:?}: {}", s, e))?;

    match channels.as_slice() {
        [r, g, b] => Ok(Rgb([*r, *g, *b])),
        _ => Err(format!("expected R,G,B, got {:?}", s)),
    }
}

fn parse_coord(s: &str) -> std::result::Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {:?}", s))?;
    let x = x.trim().parse().map_err(|e| format!("invalid x {:?}: {}", x, e))?;
    let y = y.trim().parse().map_err(|e| format!("invalid y {:?}: {}", y, e))?;
    Ok((x, y))
}

fn area_limit(max_area: Option<u32>, default: AreaLimit) -> AreaLimit {
    max_area.map(AreaLimit::Pixels).unwrap_or(default)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("shapetrace starting");

    match args.command {
        Command::Still {
            image,
            pick,
            color,
            threshold,
            min_area,
            max_area,
            output,
            svg,
            save_mask,
        } => {
            let frame = image::open(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?
                .to_rgb8();
            let (width, height) = frame.dimensions();
            let buffer = PixelBuffer::from(&frame);
            tracing::info!("Loaded {}: {}x{}", image.display(), width, height);

            let reference = match (color, pick) {
                (Some(color), _) => color,
                (None, Some((x, y))) => pick_color(&buffer, x, y)
                    .ok_or_else(|| anyhow!("Pick ({}, {}) is outside the {}x{} image", x, y, width, height))?,
                (None, None) => bail!("Either --color or --pick is required"),
            };
            tracing::info!("Reference color: {:?}, threshold {}", reference.0, threshold);

            let config = ExtractConfig {
                min_area,
                max_area: area_limit(max_area, AreaLimit::ImageArea),
                ..ExtractConfig::default()
            };
            let mut pipeline =
                FramePipeline::new(config, create_classifier(Some(reference), threshold));

            let shapes = pipeline
                .process(&buffer)
                .context("Failed to extract shapes")?;
            tracing::info!("Extracted {} shape(s)", shapes.len());

            save_shapes(&output, &shapes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Saved shapes to {}", output.display());

            if let Some(svg) = svg {
                save_collection_svg(&svg, &shapes, width, height)
                    .with_context(|| format!("Failed to write {}", svg.display()))?;
            }

            if let Some(mask_path) = save_mask {
                if let Some(mask) = pipeline.last_mask() {
                    mask.to_image()
                        .save(&mask_path)
                        .with_context(|| format!("Failed to save mask {}", mask_path.display()))?;
                    tracing::info!("Saved mask to {}", mask_path.display());
                }
            }
        }

        Command::Track {
            frames,
            color,
            threshold,
            min_area,
            max_area,
            output_dir,
        } => {
            tracing::info!("Tracking color {:?}, threshold {}", color.0, threshold);
            let config = ExtractConfig {
                min_area,
                max_area: area_limit(max_area, AreaLimit::ImageArea),
                ..ExtractConfig::default()
            };
            let pipeline =
                FramePipeline::new(config, create_classifier(Some(color), threshold));
            run_sequence(&frames, &output_dir, pipeline)?;
        }

        Command::Motion {
            frames,
            threshold,
            min_area,
            max_area,
            output_dir,
        } => {
            tracing::info!("Detecting motion, threshold {}", threshold);
            let config = ExtractConfig {
                min_area,
                max_area: area_limit(max_area, AreaLimit::ImageFraction(25)),
                ..ExtractConfig::default()
            };
            let pipeline = FramePipeline::new(config, create_classifier(None, threshold));
            run_sequence(&frames, &output_dir, pipeline)?;
        }

        Command::Smooth {
            input,
            coefficient,
            svg,
        } => {
            let (region, color) = load_first_shape(&input)
                .with_context(|| format!("Failed to load shape from {}", input.display()))?;
            tracing::info!(
                "Loaded shape with {} outline points, color {:?}",
                region.points().len(),
                color.0
            );

            let path = smooth(&region, color, coefficient);
            tracing::info!(
                "Fitted {} cubic segment(s) with coefficient {}",
                path.len(),
                coefficient
            );

            if let Some(svg) = svg {
                let bbox = region.bounding_box();
                let width = (bbox.max_x() + 1).max(1) as u32;
                let height = (bbox.max_y() + 1).max(1) as u32;
                save_paths_svg(&svg, &[path], width, height)
                    .with_context(|| format!("Failed to write {}", svg.display()))?;
            }
        }
    }

    Ok(())
}

fn run_sequence(frames: &Path, output_dir: &Path, mut pipeline: FramePipeline) -> Result<()> {
    let mut source = ImageSequence::open(frames)
        .with_context(|| format!("Failed to open frame directory {}", frames.display()))?;
    let mut sink = XmlSequenceWriter::new(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    tracing::info!("Processing {} frames from {}", source.len(), frames.display());

    let history = run_pipeline(&mut source, &mut sink, &mut pipeline)
        .context("Failed to process frame sequence")?;

    let (width, height) = source.resolution();
    tracing::info!(
        "Wrote {} frame file(s), {} shapes total, last frame {}x{}",
        sink.written(),
        history.total_shapes(),
        width,
        height
    );

    Ok(())
}
