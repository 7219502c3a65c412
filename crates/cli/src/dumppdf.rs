//! dumppdf - dump a PDF's internal object structure as XML.
//!
//! A thin collaborator over `pdfreed-core`: no rendering, no text
//! extraction, just a walk over the object model.

use clap::{ArgAction, Parser};
use pdfreed_core::{DocumentOptions, PDFObject, PdfError, Result};
use std::collections::HashSet;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCodec {
    None,
    Raw,
    Binary,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "dumppdf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Dump every object reachable from the cross-reference index
    #[arg(short = 'a', long = "all", action = ArgAction::SetTrue)]
    all: bool,

    /// Dump a single object by id
    #[arg(short = 'o', long = "object")]
    object: Option<u32>,

    /// Dump raw (undecoded) stream bytes
    #[arg(short = 'r', long = "raw", action = ArgAction::SetTrue)]
    raw: bool,

    /// Dump decoded (filters-applied) stream bytes
    #[arg(short = 'b', long = "binary", action = ArgAction::SetTrue)]
    binary: bool,

    /// Include decoded stream text in the XML body
    #[arg(short = 't', long = "text", action = ArgAction::SetTrue)]
    text: bool,

    /// Document password
    #[arg(short = 'P', long = "password", default_value = "")]
    password: String,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

fn escape(s: &[u8]) -> String {
    let mut result = String::new();
    for &byte in s {
        match byte {
            b'&' => result.push_str("&amp;"),
            b'<' => result.push_str("&lt;"),
            b'>' => result.push_str("&gt;"),
            b'"' => result.push_str("&quot;"),
            b'\'' => result.push_str("&#39;"),
            0..=31 | 127..=255 => result.push_str(&format!("&#{byte};")),
            _ => result.push(byte as char),
        }
    }
    result
}

fn escape_str(s: &str) -> String {
    escape(s.as_bytes())
}

fn dumpxml<W: Write>(
    out: &mut W,
    doc: &pdfreed_core::Document,
    obj: &PDFObject,
    codec: StreamCodec,
) -> Result<()> {
    match obj {
        PDFObject::Null => write!(out, "<null />")?,
        PDFObject::Bool(b) => write!(out, "<boolean>{}</boolean>", b)?,
        PDFObject::Int(n) => write!(out, "<number>{n}</number>")?,
        PDFObject::Real(n) => write!(out, "<number>{n}</number>")?,
        PDFObject::String { bytes, .. } => {
            write!(out, r#"<string size="{}">{}</string>"#, bytes.len(), escape(bytes))?;
        }
        PDFObject::Name(name) => write!(out, "<literal>{}</literal>", escape_str(name))?,
        PDFObject::Array(arr) => {
            writeln!(out, r#"<list size="{}">"#, arr.len())?;
            for item in arr {
                dumpxml(out, doc, item, codec)?;
                writeln!(out)?;
            }
            write!(out, "</list>")?;
        }
        PDFObject::Dict(dict) => {
            writeln!(out, r#"<dict size="{}">"#, dict.len())?;
            for (k, v) in dict {
                writeln!(out, "<key>{}</key>", escape_str(k))?;
                write!(out, "<value>")?;
                dumpxml(out, doc, v, codec)?;
                writeln!(out, "</value>")?;
            }
            write!(out, "</dict>")?;
        }
        PDFObject::Stream(stream) => match codec {
            StreamCodec::Raw => out.write_all(stream.rawdata())?,
            StreamCodec::Binary => {
                let data = doc.decode_stream(stream)?;
                out.write_all(&data)?;
            }
            StreamCodec::Text | StreamCodec::None => {
                writeln!(out, "<stream>")?;
                writeln!(out, "<props>")?;
                dumpxml(out, doc, &PDFObject::Dict(stream.attrs.clone()), codec)?;
                writeln!(out)?;
                writeln!(out, "</props>")?;
                if codec == StreamCodec::Text {
                    let data = doc.decode_stream(stream).unwrap_or_default();
                    writeln!(out, r#"<data size="{}">{}</data>"#, data.len(), escape(&data))?;
                }
                write!(out, "</stream>")?;
            }
        },
        PDFObject::Ref(objref) => write!(out, r#"<ref id="{}" />"#, objref.objid)?,
    }
    Ok(())
}

fn dump_all_objects<W: Write>(out: &mut W, doc: &pdfreed_core::Document, codec: StreamCodec) -> Result<()> {
    write!(out, "<pdf>")?;
    let mut visited = HashSet::new();
    for objid in doc.object_ids() {
        if !visited.insert(objid) {
            continue;
        }
        match doc.getobj(objid) {
            Ok(obj) => {
                writeln!(out, r#"<object id="{objid}">"#)?;
                dumpxml(out, doc, &obj, codec)?;
                writeln!(out)?;
                writeln!(out, "</object>")?;
                writeln!(out)?;
            }
            Err(e) => eprintln!("not found: object {objid} - {e:?}"),
        }
    }
    writeln!(out, "<trailer>")?;
    dumpxml(out, doc, &PDFObject::Dict(doc.trailer().clone()), StreamCodec::None)?;
    writeln!(out)?;
    writeln!(out, "</trailer>")?;
    write!(out, "</pdf>")?;
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    let level = if args.debug { tracing::Level::DEBUG } else { tracing::Level::WARN };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();

    let options = DocumentOptions::builder().password(args.password.clone()).build();
    let doc = pdfreed_core::Document::load_from_path(&args.file, options)?;

    let codec = match (args.raw, args.binary, args.text) {
        (true, _, _) => StreamCodec::Raw,
        (_, true, _) => StreamCodec::Binary,
        (_, _, true) => StreamCodec::Text,
        _ => StreamCodec::None,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(objid) = args.object {
        let obj = doc.getobj(objid)?;
        dumpxml(&mut out, &doc, &obj, codec)?;
        writeln!(out)?;
    } else if args.all {
        dump_all_objects(&mut out, &doc, codec)?;
        writeln!(out)?;
    } else {
        writeln!(out, "<pdf pages=\"{}\">", doc.page_count())?;
        writeln!(out, "</pdf>")?;
    }
    out.flush().map_err(PdfError::Io)?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("dumppdf: {e}");
        std::process::exit(1);
    }
}
