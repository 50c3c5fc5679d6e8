// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate buddhabrot;
extern crate clap;
extern crate env_logger;
extern crate image;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

use buddhabrot::{
    derived_factor, fill_histograms, plot, plot_channel, BuddhaError, ColoringMode, Fractal, FractalConfig,
    Gradient, MapFunction, Palette, Plane, Registration, Result, Rgb, Scaling, StartPoint,
};
use clap::{App, Arg, ArgMatches};
use image::{DynamicImage, ImageFormat, RgbImage};
use num::Complex;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> std::result::Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> std::result::Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> std::result::Result<(), String> {
    T::from_str(s).map(|_| ()).map_err(|_| err.to_string())
}

fn validate_selector<T>(s: &str) -> std::result::Result<(), String>
where
    T: FromStr,
    T::Err: Display,
{
    T::from_str(s).map(|_| ()).map_err(|e| e.to_string())
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ITERATIONS: &str = "iterations";
const BAILOUT: &str = "bailout";
const COEFFICIENT: &str = "coefficient";
const MAP: &str = "map";
const PLANE: &str = "plane";
const REGISTER: &str = "register";
const ZOOM: &str = "zoom";
const OFFSET: &str = "offset";
const ROTATION: &str = "rotation";
const TRIES: &str = "tries";
const SEED: &str = "seed";
const POINTS: &str = "points";
const BEZIER: &str = "bezier";
const THRESHOLD: &str = "threshold";
const START: &str = "start";
const NO_BULB_FILTER: &str = "no-bulb-filter";
const IMPORTANCE: &str = "importance";
const THREADS: &str = "threads";
const COLORING: &str = "coloring";
const REFERENCE: &str = "reference";
const FUNCTION: &str = "function";
const FACTOR: &str = "factor";
const EXPOSURE: &str = "exposure";

fn args<'a>() -> ArgMatches<'a> {
    App::new("buddha")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Buddhabrot, anti-buddhabrot and primitive-brot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output image; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("512x512")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 100000000",
                    )
                })
                .help("Iteration cap per orbit"),
        )
        .arg(
            Arg::with_name(BAILOUT)
                .long(BAILOUT)
                .short("b")
                .takes_value(true)
                .default_value("4")
                .validator(|s| validate_number::<f64>(&s, "Could not parse bailout"))
                .help("Squared escape radius"),
        )
        .arg(
            Arg::with_name(COEFFICIENT)
                .long(COEFFICIENT)
                .takes_value(true)
                .default_value("1,0")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse coefficient"))
                .help("Coefficient of the map function, as re,im"),
        )
        .arg(
            Arg::with_name(MAP)
                .long(MAP)
                .short("m")
                .takes_value(true)
                .default_value("quadratic")
                .validator(|s| validate_selector::<MapFunction>(&s))
                .help("Map function: quadratic, coefficient, cubic, tricorn or burningship"),
        )
        .arg(
            Arg::with_name(PLANE)
                .long(PLANE)
                .short("p")
                .takes_value(true)
                .default_value("zrzi")
                .validator(|s| validate_selector::<Plane>(&s))
                .help("Projection plane: zrzi, zrcr, zrci, zicr, zici or crci"),
        )
        .arg(
            Arg::with_name(REGISTER)
                .long(REGISTER)
                .short("r")
                .takes_value(true)
                .default_value("escapes")
                .validator(|s| validate_selector::<Registration>(&s))
                .help("Which orbits are plotted: escapes, anti or primitive"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1")
                .validator(|s| validate_number::<f64>(&s, "Could not parse zoom"))
                .help("Magnification of the view"),
        )
        .arg(
            Arg::with_name(OFFSET)
                .long(OFFSET)
                .takes_value(true)
                .default_value("0,0")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse offset"))
                .help("Offset of the view, as re,im"),
        )
        .arg(
            Arg::with_name(ROTATION)
                .long(ROTATION)
                .takes_value(true)
                .default_value("0")
                .allow_hyphen_values(true)
                .validator(|s| validate_number::<f64>(&s, "Could not parse rotation"))
                .help("Rotation of the view, in radians"),
        )
        .arg(
            Arg::with_name(TRIES)
                .long(TRIES)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(|s| validate_number::<f64>(&s, "Could not parse tries"))
                .help("Orbit attempts per pixel"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_number::<u64>(&s, "Could not parse seed"))
                .help("Random seed"),
        )
        .arg(
            Arg::with_name(POINTS)
                .long(POINTS)
                .takes_value(true)
                .default_value("100")
                .validator(|s| validate_number::<usize>(&s, "Could not parse path points"))
                .help("Most pixels drawn per path segment"),
        )
        .arg(
            Arg::with_name(BEZIER)
                .long(BEZIER)
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        32,
                        "Could not parse bezier level",
                        "Bezier level must be between 1 and 32",
                    )
                })
                .help("Degree of the path curves; 1 draws straight lines"),
        )
        .arg(
            Arg::with_name(THRESHOLD)
                .long(THRESHOLD)
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_number::<usize>(&s, "Could not parse threshold"))
                .help("Orbits shorter than this are not plotted"),
        )
        .arg(
            Arg::with_name(START)
                .long(START)
                .takes_value(true)
                .default_value("origin")
                .validator(|s| validate_selector::<StartPoint>(&s))
                .help("Where orbits start: origin, parameter or random"),
        )
        .arg(
            Arg::with_name(NO_BULB_FILTER)
                .long(NO_BULB_FILTER)
                .help("Also iterate points inside the known Mandelbrot bulbs"),
        )
        .arg(
            Arg::with_name(IMPORTANCE)
                .long(IMPORTANCE)
                .takes_value(true)
                .help("Also write an image of where long orbits were found"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("n")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse thread count",
                        "Thread count must be between 1 and 1024",
                    )
                })
                .help("Number of sampling threads [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(COLORING)
                .long(COLORING)
                .short("c")
                .takes_value(true)
                .default_value("modulo")
                .validator(|s| validate_selector::<ColoringMode>(&s))
                .help("Coloring: modulo, iteration, orbit, vector, path or image"),
        )
        .arg(
            Arg::with_name(REFERENCE)
                .long(REFERENCE)
                .takes_value(true)
                .help("Reference image for image coloring"),
        )
        .arg(
            Arg::with_name(FUNCTION)
                .long(FUNCTION)
                .short("f")
                .takes_value(true)
                .default_value("exp")
                .validator(|s| validate_selector::<Scaling>(&s))
                .help("Color scaling function: exp, log, sqrt or lin"),
        )
        .arg(
            Arg::with_name(FACTOR)
                .long(FACTOR)
                .takes_value(true)
                .default_value("-1")
                .allow_hyphen_values(true)
                .validator(|s| validate_number::<f64>(&s, "Could not parse factor"))
                .help("Factor of the scaling function; -1 derives it from the registered pixels per orbit try"),
        )
        .arg(
            Arg::with_name(EXPOSURE)
                .long(EXPOSURE)
                .short("e")
                .takes_value(true)
                .default_value("1")
                .validator(|s| validate_number::<f64>(&s, "Could not parse exposure"))
                .help("Exposure of the output image"),
        )
        .get_matches()
}

/// Parses an argument clap has already validated, or whose default is
/// valid.
fn value<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: FromStr,
{
    let raw = matches.value_of(name).unwrap_or_default();
    T::from_str(raw).map_err(|_| BuddhaError::InvalidConfig(format!("bad {}: {}", name, raw)))
}

fn complex(matches: &ArgMatches, name: &str) -> Result<Complex<f64>> {
    let raw = matches.value_of(name).unwrap_or_default();
    parse_complex(raw).ok_or_else(|| BuddhaError::InvalidConfig(format!("bad {}: {}", name, raw)))
}

fn config(matches: &ArgMatches) -> Result<FractalConfig> {
    let size = matches.value_of(SIZE).unwrap_or_default();
    let (width, height) = parse_pair::<usize>(size, 'x')
        .ok_or_else(|| BuddhaError::InvalidConfig(format!("bad size: {}", size)))?;

    Ok(FractalConfig {
        width,
        height,
        iterations: value(matches, ITERATIONS)?,
        bailout: value(matches, BAILOUT)?,
        coefficient: complex(matches, COEFFICIENT)?,
        map: value(matches, MAP)?,
        plane: value(matches, PLANE)?,
        registration: value(matches, REGISTER)?,
        zoom: value(matches, ZOOM)?,
        offset: complex(matches, OFFSET)?,
        rotation: value(matches, ROTATION)?,
        tries: value(matches, TRIES)?,
        seed: value(matches, SEED)?,
        path_points: value(matches, POINTS)?,
        bezier_level: value(matches, BEZIER)?,
        threshold: value(matches, THRESHOLD)?,
        start: value(matches, START)?,
        bulb_filter: !matches.is_present(NO_BULB_FILTER),
        importance: matches.is_present(IMPORTANCE),
    })
}

/// Blue, green and red over black, spread evenly over the orbit.
fn palette(mode: ColoringMode) -> Result<Palette> {
    let colors = vec![
        Rgb::new(0.0, 0.0, 1.0),
        Rgb::new(0.0, 1.0, 0.0),
        Rgb::new(1.0, 0.0, 0.0),
    ];
    let ranges = (0..colors.len())
        .map(|i| i as f64 / colors.len() as f64)
        .collect();
    let gradient = Gradient::uniform(colors, Rgb::BLACK, 1024)?;
    Palette::new(mode, gradient, ranges)
}

fn load_reference(path: &str) -> Result<RgbImage> {
    let format = ImageFormat::from_path(path)?;
    let file = BufReader::new(File::open(path)?);
    Ok(image::load(file, format)?.to_rgb8())
}

fn save_image(image: RgbImage, path: &str) -> Result<()> {
    let format = ImageFormat::from_path(path)?;
    let mut file = BufWriter::new(File::create(path)?);
    DynamicImage::ImageRgb8(image).write_to(&mut file, format)?;
    info!("Wrote {}", path);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = config(matches)?;
    let tries = config.tries;
    let threads = match matches.value_of(THREADS) {
        Some(_) => value(matches, THREADS)?,
        None => num_cpus::get(),
    };
    let coloring = palette(value(matches, COLORING)?)?;

    let mut frac = Fractal::new(config)?;
    if let Some(path) = matches.value_of(REFERENCE) {
        frac.set_reference(load_reference(path)?);
    }

    let ratio = fill_histograms(&mut frac, &coloring, threads)?;

    let scaling: Scaling = value(matches, FUNCTION)?;
    let mut factor: f64 = value(matches, FACTOR)?;
    if factor == -1.0 {
        let pixels = frac.stats().pixel_ratio();
        factor = derived_factor(pixels, tries);
        info!(
            "Derived factor {} from {} pixels per try (orbit ratio {})",
            factor, pixels, ratio
        );
    }
    let exposure: f64 = value(matches, EXPOSURE)?;

    let output = matches.value_of(OUTPUT).unwrap_or_default();
    save_image(plot(&frac.histogram, scaling, factor, exposure), output)?;

    if let (Some(path), Some(importance)) = (matches.value_of(IMPORTANCE), frac.importance.as_ref()) {
        save_image(plot_channel(importance, Scaling::Exp, 1.0), path)?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = args();

    match run(&matches) {
        Ok(()) => {}
        Err(BuddhaError::BlackRender) => {
            eprintln!("Black render: no orbits were registered. Try more tries or a lower threshold.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
    }
}
