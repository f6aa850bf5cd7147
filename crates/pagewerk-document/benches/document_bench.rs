// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagewerk-document crate: range parsing and
// page assembly on generated documents.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagewerk_core::PageRange;
use pagewerk_document::SourceDocument;
use pagewerk_document::fixtures::sample_pdf;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Parse a range expression mixing singles, spans, reversed spans, and junk.
fn bench_range_parse(c: &mut Criterion) {
    let expression = "1,3,5-10, 40-20 ,abc,7,100-150,2-2,";
    c.bench_function("range_parse (mixed)", |b| {
        b.iter(|| black_box(PageRange::parse(black_box(expression))));
    });
}

/// Split every other page out of a 50-page document.
fn bench_split(c: &mut Criterion) {
    let document = SourceDocument::from_pdf_bytes("bench.pdf", sample_pdf(50))
        .expect("ingest benchmark document");
    let range = PageRange::parse("1-50");
    let odd = PageRange::from_ordinals(range.ordinals().step_by(2));

    c.bench_function("split (25 of 50 pages)", |b| {
        b.iter(|| black_box(pagewerk_document::split(&document, &odd).expect("split")));
    });
}

/// Merge three 20-page documents.
fn bench_merge(c: &mut Criterion) {
    let documents: Vec<SourceDocument> = (0..3)
        .map(|n| {
            SourceDocument::from_pdf_bytes(format!("part{n}.pdf"), sample_pdf(20))
                .expect("ingest benchmark document")
        })
        .collect();

    c.bench_function("merge (3 x 20 pages)", |b| {
        b.iter(|| black_box(pagewerk_document::merge(&documents).expect("merge")));
    });
}

criterion_group!(benches, bench_range_parse, bench_split, bench_merge);
criterion_main!(benches);
