use std::fs;
use std::io::{self, Read, Write};
use std::str::FromStr;

use a2s::{ObjectLibrary, RenderOptions, Scale};
use facet::Facet;
use facet_args as args;
use log::{debug, LevelFilter};

/// Convert ASCII art diagrams to SVG
#[derive(Facet, Debug)]
struct Args {
    /// Input file (reads from stdin if not provided)
    #[facet(default, args::positional)]
    input: Option<String>,

    /// Output file (writes to stdout if not provided)
    #[facet(default, args::named, args::short = 'o')]
    output: Option<String>,

    /// Width of one character cell in pixels
    #[facet(default, args::named)]
    scale_x: Option<f64>,

    /// Height of one character cell in pixels
    #[facet(default, args::named)]
    scale_y: Option<f64>,

    /// Font family list for text
    #[facet(default, args::named)]
    font_family: Option<String>,

    /// Use the drop shadow without Gaussian blur
    #[facet(args::named)]
    no_blur: bool,

    /// Directory of `*.path` custom object files
    #[facet(default, args::named)]
    objects: Option<String>,

    /// Log level: off, error, warn, info, debug or trace
    #[facet(default, args::named)]
    log_level: Option<String>,
}

fn main() {
    let args: Args = match args::from_std_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let level = args.log_level.as_deref().unwrap_or("warn");
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!("{args:?}");

    let library = match &args.objects {
        Some(dir) => ObjectLibrary::load_dir(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load objects from {dir}: {e}");
            std::process::exit(1);
        }),
        None => ObjectLibrary::new(),
    };

    let input = match &args.input {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("Failed to read stdin: {}", e);
                std::process::exit(1);
            });
            buf
        }
    };

    let scale = Scale::new(
        args.scale_x.unwrap_or(Scale::DEFAULT_X),
        args.scale_y.unwrap_or(Scale::DEFAULT_Y),
    );
    let mut options = RenderOptions::new()
        .with_scale(scale)
        .with_blur(!args.no_blur);
    if let Some(font_family) = &args.font_family {
        options = options.with_font_family(font_family.as_str());
    }
    let svg = a2s::render_with_options(&input, &options, &library);

    match &args.output {
        Some(path) => {
            fs::write(path, &svg).unwrap_or_else(|e| {
                eprintln!("Failed to write {}: {}", path, e);
                std::process::exit(1);
            });
        }
        None => {
            io::stdout().write_all(svg.as_bytes()).unwrap_or_else(|e| {
                eprintln!("Failed to write stdout: {}", e);
                std::process::exit(1);
            });
        }
    }
}
