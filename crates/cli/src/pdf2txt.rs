//! pdf2txt - a minimal text dump driven by the content-stream interpreter.
//!
//! Text shaping is explicitly out of scope for `pdfreed-core` (complex
//! scripts, ligatures, and font-shape engines are external collaborators),
//! so this tool renders each `PlacedText` glyph code as its raw byte value.
//! That is a faithful approximation for simple Latin-encoded documents and
//! nothing more — a real text extractor belongs downstream of this crate.

use clap::{ArgAction, Parser};
use pdfreed_core::interp::{NeverPause, PageElement};
use pdfreed_core::{DocumentOptions, PdfError, Result};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdf2txt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Page numbers to render, 1-indexed (default: all pages)
    #[arg(long = "page-numbers")]
    page_numbers: Option<String>,

    /// Document password
    #[arg(short = 'P', long = "password", default_value = "")]
    password: String,

    /// Print document metadata instead of page text
    #[arg(short = 'm', long = "metadata", action = ArgAction::SetTrue)]
    metadata: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

fn parse_page_numbers(spec: &str, page_count: u32) -> Vec<u32> {
    let mut pages = Vec::new();
    for part in spec.split_whitespace() {
        if let Ok(n) = part.parse::<u32>() {
            if n >= 1 && n <= page_count {
                pages.push(n - 1);
            }
        }
    }
    pages
}

fn render_page_text<W: Write>(out: &mut W, page: &pdfreed_core::Page<'_>) -> Result<()> {
    let mut elements: Vec<PageElement> = Vec::new();
    let mut pause = NeverPause;
    page.interpret(&mut elements, &mut pause)?;

    for element in &elements {
        if let PageElement::PlacedText { glyphs, .. } = element {
            for glyph in glyphs {
                out.write_all(&[glyph.code as u8])?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    let level = if args.debug { tracing::Level::DEBUG } else { tracing::Level::WARN };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for path in &args.files {
        let options = DocumentOptions::builder().password(args.password.clone()).build();
        let doc = pdfreed_core::Document::load_from_path(path, options)?;

        if args.metadata {
            for (key, value) in doc.metadata() {
                writeln!(out, "{key}: {value}")?;
            }
            continue;
        }

        let page_count = doc.page_count();
        let pages = match &args.page_numbers {
            Some(spec) => parse_page_numbers(spec, page_count),
            None => (0..page_count).collect(),
        };

        for page_index in pages {
            let page = doc.page(page_index)?;
            render_page_text(&mut out, &page)?;
        }
    }

    out.flush().map_err(PdfError::Io)?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("pdf2txt: {e}");
        std::process::exit(1);
    }
}
