//! pdf_graft command-line front end.
//!
//! Usage:
//!   pdf_graft info <in.pdf> [--password PW]
//!   pdf_graft merge -o <out.pdf> <a.pdf> <b.pdf> [...]
//!   pdf_graft split <in.pdf> <ranges> -o <out.pdf> [--each]
//!   pdf_graft organize <in.pdf> <order> -o <out.pdf>
//!   pdf_graft rotate <in.pdf> <degrees> -o <out.pdf> [--pages LIST]
//!   pdf_graft crop <in.pdf> <top> <right> <bottom> <left> -o <out.pdf> [--pages LIST]
//!   pdf_graft watermark <in.pdf> <text> -o <out.pdf> [--opacity N] [--size N] [--rotation N]
//!   pdf_graft number <in.pdf> -o <out.pdf> [--format "{n} / {total}"]
//!   pdf_graft protect <in.pdf> <password> -o <out.pdf> [--owner PW] [--rc4]
//!   pdf_graft unlock <in.pdf> <password> -o <out.pdf>
//!   pdf_graft images -o <out.pdf> <a.jpg> [...] [--page-size letter|a4] [--margin N]
//!
//! Every command that reads a PDF accepts `--password` and `--strict`;
//! every command that writes accepts `--incremental` and `--compress`.
//! Set `RUST_LOG=debug` for parser progress.

use pdf_graft::config::EngineConfig;
use pdf_graft::document::PdfDocument;
use pdf_graft::editor::{
    self, ImageFit, ImagesToPdfOptions, Margins, PageNumberOptions, ProtectOptions, WatermarkOptions,
};
use pdf_graft::encryption::Algorithm;
use pdf_graft::error::{Error, Result};
use pdf_graft::geometry::PageSize;
use pdf_graft::parser_config::ParserOptions;
use pdf_graft::reader;
use pdf_graft::writer::{self, SaveOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Flags that take no value.
const SWITCHES: &[&str] = &["--each", "--rc4", "--strict", "--incremental", "--compress"];

struct Args {
    command: String,
    positional: Vec<String>,
    options: HashMap<String, String>,
    switches: Vec<String>,
}

impl Args {
    fn from_env() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let command = args.next().ok_or_else(|| usage_error("missing command"))?;
        let mut positional = Vec::new();
        let mut options = HashMap::new();
        let mut switches = Vec::new();

        while let Some(arg) = args.next() {
            if SWITCHES.contains(&arg.as_str()) {
                switches.push(arg);
            } else if arg == "-o" || (arg.starts_with("--") && arg.len() > 2) {
                let key = if arg == "-o" { "--output".to_string() } else { arg };
                let value = args
                    .next()
                    .ok_or_else(|| usage_error(&format!("{} needs a value", key)))?;
                options.insert(key, value);
            } else {
                positional.push(arg);
            }
        }
        Ok(Self {
            command,
            positional,
            options,
            switches,
        })
    }

    fn has(&self, switch: &str) -> bool {
        self.switches.iter().any(|s| s == switch)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|v| v.parse().map_err(|_| usage_error(&format!("{} expects a number", key))))
            .transpose()
    }

    fn arg(&self, index: usize, what: &str) -> Result<&str> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| usage_error(&format!("missing {}", what)))
    }

    fn output(&self) -> Result<PathBuf> {
        self.get("--output")
            .map(PathBuf::from)
            .ok_or_else(|| usage_error("missing -o <output>"))
    }

    fn pages(&self, doc: &PdfDocument) -> Result<Option<Vec<usize>>> {
        self.get("--pages")
            .map(|list| editor::parse_page_ranges(list, doc.page_count()?))
            .transpose()
    }

    fn config(&self) -> EngineConfig {
        let parser = if self.has("--strict") {
            ParserOptions::strict()
        } else {
            ParserOptions::lenient()
        };
        let save = if self.has("--incremental") {
            SaveOptions::incremental()
        } else {
            SaveOptions::full_rewrite()
        }
        .with_compression(self.has("--compress"));
        let mut config = EngineConfig::new().with_parser(parser).with_save(save);
        if self.has("--rc4") {
            config = config.with_algorithm(Algorithm::Rc4_128);
        }
        config
    }
}

fn usage_error(message: &str) -> Error {
    Error::Validation(format!("{} (see the usage in the source header)", message))
}

fn open(path: &str, args: &Args, config: &EngineConfig) -> Result<PdfDocument> {
    let data = std::fs::read(path)?;
    let password = args.get("--password").map(str::as_bytes);
    reader::parse_with_options(&data, password, &config.parser)
}

fn save(doc: &PdfDocument, path: &Path, config: &EngineConfig) -> Result<()> {
    writer::save_to_file(doc, path, &config.save)?;
    println!("wrote {} ({} pages)", path.display(), doc.page_count()?);
    Ok(())
}

fn numbered(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    path.with_file_name(format!("{}-{}.pdf", stem, n))
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();
    match args.command.as_str() {
        "info" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let pages: Vec<_> = doc.pages()?.iter().map(|p| p.summary()).collect();
            let report = serde_json::json!({
                "version": doc.version(),
                "page_count": pages.len(),
                "encrypted": doc.is_encrypted(),
                "content_accessible": doc.is_content_accessible(),
                "objects": doc.graph().len(),
                "info": doc.info()?,
                "pages": pages,
            });
            let text = serde_json::to_string_pretty(&report)
                .map_err(|e| Error::Validation(format!("cannot format report: {}", e)))?;
            println!("{}", text);
            Ok(())
        },
        "merge" => {
            let docs = args
                .positional
                .iter()
                .map(|p| open(p, args, &config))
                .collect::<Result<Vec<_>>>()?;
            save(&editor::merge(&docs)?, &args.output()?, &config)
        },
        "split" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let ranges = args.arg(1, "page ranges")?;
            let output = args.output()?;
            if args.has("--each") {
                for (i, part) in editor::split_into_ranges(&doc, ranges)?.iter().enumerate() {
                    save(part, &numbered(&output, i + 1), &config)?;
                }
                Ok(())
            } else {
                save(&editor::split(&doc, ranges)?, &output, &config)
            }
        },
        "organize" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let order = args
                .arg(1, "page order")?
                .split(',')
                .map(|n| n.trim().parse().map_err(|_| usage_error("page order must be numbers")))
                .collect::<Result<Vec<usize>>>()?;
            save(&editor::organize(&doc, &order)?, &args.output()?, &config)
        },
        "rotate" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let degrees = args
                .arg(1, "degrees")?
                .parse()
                .map_err(|_| usage_error("degrees must be an integer"))?;
            let pages = args.pages(&doc)?;
            save(&editor::rotate(&doc, pages.as_deref(), degrees)?, &args.output()?, &config)
        },
        "crop" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let mut sides = [0.0; 4];
            for (i, side) in sides.iter_mut().enumerate() {
                *side = args
                    .arg(i + 1, "margin")?
                    .parse()
                    .map_err(|_| usage_error("margins must be numbers"))?;
            }
            let margins = Margins::new(sides[0], sides[1], sides[2], sides[3]);
            let pages = args.pages(&doc)?;
            save(&editor::crop(&doc, pages.as_deref(), margins)?, &args.output()?, &config)
        },
        "watermark" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let mut options = WatermarkOptions::new(args.arg(1, "watermark text")?);
            if let Some(opacity) = args.number("--opacity")? {
                options.opacity = opacity;
            }
            if let Some(size) = args.number("--size")? {
                options.size = size;
            }
            if let Some(rotation) = args.number("--rotation")? {
                options.rotation = rotation;
            }
            options.pages = args.pages(&doc)?;
            save(&editor::watermark(&doc, &options)?, &args.output()?, &config)
        },
        "number" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let mut options = PageNumberOptions::default();
            if let Some(format) = args.get("--format") {
                options.format = format.to_string();
            }
            options.pages = args.pages(&doc)?;
            save(&editor::number_pages(&doc, &options)?, &args.output()?, &config)
        },
        "protect" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            let mut options: ProtectOptions = config.encryption.clone();
            if let Some(owner) = args.get("--owner") {
                options = options.with_owner_password(owner);
            }
            let protected = editor::protect(&doc, args.arg(1, "password")?, &options)?;
            save(&protected, &args.output()?, &config)
        },
        "unlock" => {
            let doc = open(args.arg(0, "input file")?, args, &config)?;
            save(&editor::unlock(&doc, args.arg(1, "password")?)?, &args.output()?, &config)
        },
        "images" => {
            let jpegs = args
                .positional
                .iter()
                .map(std::fs::read)
                .collect::<std::io::Result<Vec<_>>>()?;
            let fit = match args.get("--page-size") {
                None => ImageFit::Actual,
                Some(name) => {
                    let page_size = match name.to_ascii_lowercase().as_str() {
                        "letter" => PageSize::Letter,
                        "legal" => PageSize::Legal,
                        "a4" => PageSize::A4,
                        "a5" => PageSize::A5,
                        _ => return Err(usage_error("page size must be letter, legal, a4 or a5")),
                    };
                    ImageFit::Fit {
                        page_size,
                        margin: args.number("--margin")?.unwrap_or(0.0),
                    }
                },
            };
            let doc = editor::images_to_pdf(&jpegs, &ImagesToPdfOptions { fit })?;
            save(&doc, &args.output()?, &config)
        },
        other => Err(usage_error(&format!("unknown command '{}'", other))),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let result = Args::from_env().and_then(|args| run(&args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("{}", e.category().user_message());
            ExitCode::FAILURE
        },
    }
}
