//! pager – command-line notice paginator.
//!
//! Usage:
//!   pager <input.html> [output] [--config cfg.json] [--title "Notice"] [--font body.ttf] [--json] [--no-headers]
//!
//! If `output` is omitted the result is written next to the input file with
//! the same stem (`notice.html` → `notice.print.html`, or `notice.pages.json`
//! with `--json`).

use std::{env, fs, path::PathBuf, process};

use notice_pager::layout_config::PaginatedDocument;
use notice_pager::pipeline::{generate_print_html, paginate_html_default, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut font_path: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut json = false;
    let mut no_headers = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" | "-j" => json = true,
            "--no-headers" => no_headers = true,
            "--title" | "-t" => title = Some(required_value(&mut iter, arg, &args[0])),
            "--config" | "-c" => config_path = Some(PathBuf::from(required_value(&mut iter, arg, &args[0]))),
            "--font" | "-f" => font_path = Some(PathBuf::from(required_value(&mut iter, arg, &args[0]))),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension(if json { "pages.json" } else { "print.html" });
        o
    });

    let html = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let mut config = match &config_path {
        Some(path) => match PipelineConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };
    if let Some(t) = title {
        config.title = t;
    } else if config_path.is_none() {
        // Default title: stem of the input filename.
        if let Some(stem) = input.file_stem().and_then(|s| s.to_str()) {
            config.title = stem.to_string();
        }
    }
    if font_path.is_some() {
        config.font_path = font_path;
    }
    if no_headers {
        config.geometry = config.geometry.without_headers();
    }

    let result = if json {
        paginate_html_default(&html, &config).and_then(|doc| Ok((doc.to_json()?, doc)))
    } else {
        generate_print_html(&html, &config)
    };

    match result {
        Ok((text, doc)) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            if let Err(e) = fs::write(&output, text.as_bytes()) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            report(&output, &doc, text.len());
        }
        Err(e) => {
            eprintln!("Error paginating: {e}");
            process::exit(1);
        }
    }
}

fn required_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn report(output: &std::path::Path, doc: &PaginatedDocument, bytes: usize) {
    let pages = doc.page_count();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes,
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn print_usage(prog: &str) {
    eprintln!("pager – notice paginator (notice-pager)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.html> [output] [--config cfg.json] [--title \"Notice\"] [--font body.ttf] [--json] [--no-headers]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.html>   Editor HTML to paginate (data-height annotations are used when present)");
    eprintln!("  [output]       Output path (default: same stem as input with .print.html / .pages.json)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --config, -c   JSON pipeline config (geometry, policy, letterhead, footer links)");
    eprintln!("  --title, -t    Document title (default: input filename stem)");
    eprintln!("  --font, -f     TTF font used for text measurement");
    eprintln!("  --json, -j     Write the paginated pages as JSON instead of print HTML");
    eprintln!("  --no-headers   Lay out without letterhead bands");
    eprintln!("  --help         Print this message");
}
