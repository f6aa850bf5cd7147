// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command execution — load inputs, run the engine, write the results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::human_errors::humanize_error;
use pagewerk_core::types::{PageIndex, PageOrdinal, Rgb, TransformationResult};
use pagewerk_core::{EngineConfig, PageRange};
use pagewerk_document::SourceDocument;
use tracing::{info, warn};

use crate::cli::Command;
use crate::{data_dir, output};

/// Settings shared by every command.
pub struct Context {
    pub config: EngineConfig,
    pub out_dir: PathBuf,
}

/// Run one command, returning the paths of the files it wrote.
pub fn run(command: Command, ctx: &Context) -> Result<Vec<PathBuf>> {
    let results = match command {
        Command::Info { input } => {
            let document = SourceDocument::open(&input)?;
            println!(
                "{}: {:?}, {} page(s), {} bytes",
                document.name(),
                document.kind(),
                document.page_count(),
                document.bytes().len()
            );
            Vec::new()
        }

        Command::Merge { inputs } => {
            let documents = open_all(&inputs)?;
            vec![pagewerk_document::merge(&documents)?]
        }

        Command::Split { input, pages } => {
            let document = SourceDocument::open(&input)?;
            vec![pagewerk_document::split(&document, &PageRange::parse(&pages))?]
        }

        Command::Burst { input } => {
            let document = SourceDocument::open(&input)?;
            pagewerk_document::split_to_singles(&document)?
        }

        Command::Reorder { input, order } => {
            let document = SourceDocument::open(&input)?;
            let arrangement = parse_order(&order)?;
            vec![pagewerk_document::reorder(&document, &arrangement)?]
        }

        Command::Delete { input, pages } => {
            let document = SourceDocument::open(&input)?;
            let indices = index_set(&pages, document.page_count());
            vec![pagewerk_document::delete_pages(&document, &indices)?]
        }

        Command::Rotate {
            input,
            degrees,
            pages,
        } => {
            let document = SourceDocument::open(&input)?;
            let targets = pages.map(|pages| index_set(&pages, document.page_count()));
            vec![pagewerk_document::rotate(&document, degrees, targets.as_ref())?]
        }

        Command::Watermark {
            input,
            text,
            font_size,
            opacity,
            rotation,
            color,
        } => {
            let document = SourceDocument::open(&input)?;
            let mut style = ctx.config.watermark.clone();
            if let Some(font_size) = font_size {
                style.font_size = font_size;
            }
            if let Some(opacity) = opacity {
                style.opacity = opacity;
            }
            if let Some(rotation) = rotation {
                style.rotation_degrees = rotation;
            }
            if let Some(color) = color {
                style.color = Rgb::from_hex(&color)?;
            }
            vec![pagewerk_document::watermark(&document, &text, &style)?]
        }

        Command::Paginate {
            input,
            position,
            align,
            font_size,
            margin,
        } => {
            let document = SourceDocument::open(&input)?;
            let mut style = ctx.config.pagination.clone();
            if let Some(position) = position {
                style.vertical = position.into();
            }
            if let Some(align) = align {
                style.horizontal = align.into();
            }
            if let Some(font_size) = font_size {
                style.font_size = font_size;
            }
            let margin = margin.unwrap_or(ctx.config.pagination_margin);
            vec![pagewerk_document::paginate(&document, &style, margin)?]
        }

        Command::Images {
            inputs,
            layout,
            paper,
        } => {
            let images = open_all(&inputs)?;
            let layout = layout.map(Into::into).unwrap_or(ctx.config.image_layout);
            let paper = paper.map(Into::into).unwrap_or(ctx.config.paper_size);
            let outcome = pagewerk_document::images_to_document(&images, layout, paper)?;
            for failure in &outcome.failures {
                let human = humanize_error(failure);
                warn!(%failure, "Image skipped");
                eprintln!("{} {}", human.message, human.suggestion);
            }
            vec![outcome.result]
        }

        Command::Text { input } => {
            let document = SourceDocument::open(&input)?;
            vec![pagewerk_document::extract_text(&document, |event| {
                tracing::debug!(current = event.current, total = event.total, "Text page read");
            })?]
        }

        #[cfg(feature = "pdfium")]
        Command::Rasterize {
            input,
            format,
            scale,
        } => {
            use pagewerk_document::RasterOptions;

            let document = SourceDocument::open(&input)?;
            let mut options = RasterOptions::from_config(&ctx.config);
            if let Some(format) = format {
                options.format = format.into();
            }
            if let Some(scale) = scale {
                options.scale = scale;
            }
            let renderer = pagewerk_document::PdfiumRenderer::new()?;
            vec![pagewerk_document::rasterize(
                &document,
                &renderer,
                options,
                |event| eprintln!("Rendered page {} of {}", event.current, event.total),
            )?]
        }

        Command::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            if write {
                let dir = data_dir::data_dir();
                std::fs::create_dir_all(&dir)?;
                ctx.config.save(dir.join(pagewerk_core::config::CONFIG_FILE))?;
            }
            Vec::new()
        }
    };

    write_all(&results, &ctx.out_dir)
}

fn open_all(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    paths.iter().map(SourceDocument::open).collect()
}

fn write_all(results: &[TransformationResult], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let written = results
        .iter()
        .map(|result| output::write_result(out_dir, result))
        .collect::<Result<Vec<_>>>()?;
    if !written.is_empty() {
        info!(files = written.len(), dir = %out_dir.display(), "Results written");
    }
    Ok(written)
}

/// Page numbers that must name every page exactly once, in their new order.
fn parse_order(order: &str) -> Result<Vec<PageIndex>> {
    order
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .ok()
                .and_then(|n| PageOrdinal(n).to_index())
                .ok_or_else(|| PagewerkError::InvalidInput(format!("invalid page number {token:?}")))
        })
        .collect()
}

fn index_set(expression: &str, page_count: usize) -> BTreeSet<PageIndex> {
    PageRange::parse(expression)
        .resolve(page_count)
        .into_iter()
        .collect()
}
