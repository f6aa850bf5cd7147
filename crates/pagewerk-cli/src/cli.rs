// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface — argument definitions and their mapping onto engine types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pagewerk_core::types::{HorizontalAlignment, ImageLayout, PaperSize, VerticalPosition};
#[cfg(feature = "pdfium")]
use pagewerk_core::types::RasterFormat;

#[derive(Debug, Parser)]
#[command(name = "pagewerk")]
#[command(version)]
#[command(about = "Merge, split, reorder, stamp, and extract PDF pages locally", long_about = None)]
pub struct Cli {
    /// Directory results are written to
    #[arg(short, long, global = true, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Configuration file (defaults to config.json in the data directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show page count and kind of a document
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Concatenate documents in the order given
    Merge {
        #[arg(value_name = "FILE", num_args = 2.., required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Extract a page range into a new document
    Split {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g. "1,3,5-10")
        #[arg(short, long)]
        pages: String,
    },

    /// Write every page as its own document
    Burst {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Rearrange pages
    Reorder {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// New order as page numbers, naming every page once (e.g. "3,1,2")
        #[arg(long)]
        order: String,
    },

    /// Remove pages
    Delete {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Pages to remove (e.g. "2,4-6")
        #[arg(short, long)]
        pages: String,
    },

    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Clockwise degrees to add (negative turns counter-clockwise)
        #[arg(short, long, allow_hyphen_values = true)]
        degrees: i32,

        /// Pages to rotate (all pages if omitted)
        #[arg(short, long)]
        pages: Option<String>,
    },

    /// Stamp text across every page
    Watermark {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long)]
        text: String,

        #[arg(long)]
        font_size: Option<f32>,

        /// Opacity from 0 to 1
        #[arg(long)]
        opacity: Option<f32>,

        /// Counter-clockwise rotation in degrees
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f32>,

        /// Colour as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },

    /// Number every page as "n / total"
    Paginate {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_enum)]
        position: Option<PositionArg>,

        #[arg(long, value_enum)]
        align: Option<AlignArg>,

        #[arg(long)]
        font_size: Option<f32>,

        /// Distance from the page edges in points
        #[arg(long)]
        margin: Option<f32>,
    },

    /// Build a document with one page per image
    Images {
        #[arg(value_name = "IMAGE", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,

        #[arg(long, value_enum)]
        paper: Option<PaperArg>,
    },

    /// Extract text, one delimited section per page
    Text {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Render every page to an image inside a ZIP archive
    #[cfg(feature = "pdfium")]
    Rasterize {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Render scale (1.0 = 72 DPI)
        #[arg(long)]
        scale: Option<f32>,
    },

    /// Print the effective configuration
    Config {
        /// Also save it to the data directory
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PositionArg {
    Top,
    Bottom,
}

impl From<PositionArg> for VerticalPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Top => Self::Top,
            PositionArg::Bottom => Self::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for HorizontalAlignment {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => Self::Left,
            AlignArg::Center => Self::Center,
            AlignArg::Right => Self::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    /// Page size matches the image
    Fit,
    Portrait,
    Landscape,
}

impl From<LayoutArg> for ImageLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Fit => Self::FitToImage,
            LayoutArg::Portrait => Self::StandardPortrait,
            LayoutArg::Landscape => Self::StandardLandscape,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
        }
    }
}

#[cfg(feature = "pdfium")]
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpeg,
}

#[cfg(feature = "pdfium")]
impl From<FormatArg> for RasterFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Jpeg => Self::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_rotation_parses() {
        let cli = Cli::try_parse_from(["pagewerk", "rotate", "a.pdf", "--degrees", "-90"])
            .expect("parse");
        assert!(matches!(cli.command, Command::Rotate { degrees: -90, .. }));
    }

    #[test]
    fn merge_needs_two_inputs() {
        assert!(Cli::try_parse_from(["pagewerk", "merge", "only.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pagewerk", "merge", "a.pdf", "b.pdf"]).is_ok());
    }
}
