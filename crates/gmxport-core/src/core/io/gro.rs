use crate::core::io::traits::{MolecularFile, ReadableFile};
use nalgebra::{Matrix3, Point3, Vector3};
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Supported number of decimals for coordinates.
pub const PRECISION_RANGE: RangeInclusive<usize> = 1..=16;
pub const DEFAULT_PRECISION: usize = 3;

/// Residue and atom numbers are written modulo this value.
const NUMBER_WRAP: usize = 100_000;
const NAME_WIDTH: usize = 5;
const COORDINATES_START: usize = 20;

/// One particle record of a coordinate file.
#[derive(Debug, Clone, PartialEq)]
pub struct GroParticle {
    pub residue_number: usize,
    pub residue_name: String,
    pub atom_name: String,
    pub atom_number: usize,
    /// Position in nanometers.
    pub position: Point3<f64>,
}

/// A single coordinate frame: title, particles, and box.
#[derive(Debug, Clone, PartialEq)]
pub struct GroFrame {
    pub title: String,
    pub particles: Vec<GroParticle>,
    /// Box vectors as matrix rows, in nanometers.
    pub box_vectors: Matrix3<f64>,
    /// Decimals used for coordinates.
    pub precision: usize,
}

#[derive(Debug, Error)]
pub enum GroError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: GroParseErrorKind },
    #[error("Coordinate precision {0} is outside the supported range 1..=16")]
    InvalidPrecision(usize),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum GroParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Cannot infer coordinate precision from the first particle record")]
    UnknownPrecision,
    #[error("Box line must contain 3 or 9 values, found {0}")]
    InvalidBox(usize),
}

fn columns(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("")
}

fn parse_int(line: &str, line_num: usize, start: usize, end: usize) -> Result<usize, GroError> {
    let value = columns(line, start, end).trim();
    value.parse().map_err(|_| GroError::Parse {
        line: line_num,
        kind: GroParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, GroError> {
    let value = columns(line, start, end).trim();
    value.parse().map_err(|_| GroError::Parse {
        line: line_num,
        kind: GroParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Infers coordinate precision from the spacing between the last two decimal points.
fn infer_precision(line: &str) -> Option<usize> {
    let mut periods = line.match_indices('.').map(|(i, _)| i).rev();
    let last = periods.next()?;
    let previous = periods.next()?;
    (last - previous).checked_sub(NAME_WIDTH).filter(|p| *p > 0)
}

fn truncate(name: &str, width: usize) -> &str {
    match name.char_indices().nth(width) {
        Some((end, _)) => &name[..end],
        None => name,
    }
}

fn is_rectangular(box_vectors: &Matrix3<f64>) -> bool {
    (0..3).all(|i| (0..3).all(|j| i == j || box_vectors[(i, j)] == 0.0))
}

pub struct GroFile;

impl MolecularFile for GroFile {
    type Document = GroFrame;
    type Error = GroError;

    fn write_to(frame: &GroFrame, writer: &mut impl Write) -> Result<(), Self::Error> {
        if !PRECISION_RANGE.contains(&frame.precision) {
            return Err(GroError::InvalidPrecision(frame.precision));
        }
        let p = frame.precision;
        let width = p + NAME_WIDTH;

        writeln!(writer, "{}", frame.title)?;
        writeln!(writer, "{}", frame.particles.len())?;
        for particle in &frame.particles {
            writeln!(
                writer,
                "{:>5}{:<5}{:>5}{:>5}{:>w$.p$}{:>w$.p$}{:>w$.p$}",
                particle.residue_number % NUMBER_WRAP,
                truncate(&particle.residue_name, NAME_WIDTH),
                truncate(&particle.atom_name, NAME_WIDTH),
                particle.atom_number % NUMBER_WRAP,
                particle.position.x,
                particle.position.y,
                particle.position.z,
                w = width,
                p = p,
            )?;
        }

        let b = &frame.box_vectors;
        for i in 0..3 {
            write!(writer, "{:11.7}", b[(i, i)])?;
        }
        if !is_rectangular(b) {
            for (i, j) in [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)] {
                write!(writer, "{:11.7}", b[(i, j)])?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl ReadableFile for GroFile {
    fn read_from(reader: &mut impl BufRead) -> Result<GroFrame, Self::Error> {
        let mut lines = reader.lines();

        let title = lines
            .next()
            .ok_or_else(|| GroError::MissingRecord("title line".into()))??;
        let count_line = lines
            .next()
            .ok_or_else(|| GroError::MissingRecord("particle count".into()))??;
        let n_particles = parse_int(&count_line, 2, 0, count_line.len())?;

        let mut particles = Vec::with_capacity(n_particles);
        let mut precision = DEFAULT_PRECISION;
        for i in 0..n_particles {
            let line_num = i + 3;
            let line = lines
                .next()
                .ok_or_else(|| GroError::MissingRecord(format!("particle record {}", i + 1)))??;

            if i == 0 {
                precision = infer_precision(&line).ok_or(GroError::Parse {
                    line: line_num,
                    kind: GroParseErrorKind::UnknownPrecision,
                })?;
            }
            let width = precision + NAME_WIDTH;
            let x0 = COORDINATES_START;
            let (x1, x2, x3) = (x0 + width, x0 + 2 * width, x0 + 3 * width);

            particles.push(GroParticle {
                residue_number: parse_int(&line, line_num, 0, 5)?,
                residue_name: columns(&line, 5, 10).trim().to_string(),
                atom_name: columns(&line, 10, 15).trim().to_string(),
                atom_number: parse_int(&line, line_num, 15, 20)?,
                position: Point3::new(
                    parse_float(&line, line_num, x0, x1)?,
                    parse_float(&line, line_num, x1, x2)?,
                    parse_float(&line, line_num, x2, x3)?,
                ),
            });
        }

        let box_line_num = n_particles + 3;
        let box_line = lines
            .next()
            .ok_or_else(|| GroError::MissingRecord("box line".into()))??;
        let values = box_line
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>().map_err(|_| GroError::Parse {
                    line: box_line_num,
                    kind: GroParseErrorKind::InvalidFloat {
                        columns: "box".to_string(),
                        value: v.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let box_vectors = match values.as_slice() {
            [x, y, z] => Matrix3::from_diagonal(&Vector3::new(*x, *y, *z)),
            [xx, yy, zz, xy, xz, yx, yz, zx, zy] => {
                Matrix3::new(*xx, *xy, *xz, *yx, *yy, *yz, *zx, *zy, *zz)
            }
            other => {
                return Err(GroError::Parse {
                    line: box_line_num,
                    kind: GroParseErrorKind::InvalidBox(other.len()),
                });
            }
        };

        Ok(GroFrame {
            title,
            particles,
            box_vectors,
            precision,
        })
    }
}
