//! Parser for MovieLens data files.
//!
//! Two layouts are understood:
//! - MovieLens "latest" CSV: `movies.csv` (`movieId,title,genres`) and
//!   `ratings.csv` (`userId,movieId,rating,timestamp`), each with a header row
//!   and with titles quoted when they contain commas
//! - MovieLens 1M: `movies.dat` (`movieId::title::genres`) and
//!   `ratings.dat` (`userId::movieId::rating::timestamp`), Latin-1 encoded

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// On-disk layout of a dataset directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Dat,
}

impl DatasetFormat {
    /// Detect the layout of `data_dir`, preferring CSV when both are present.
    pub fn detect(data_dir: &Path) -> Result<Self> {
        for format in [DatasetFormat::Csv, DatasetFormat::Dat] {
            let (movies, ratings) = format.paths(data_dir);
            if movies.is_file() && ratings.is_file() {
                return Ok(format);
            }
        }
        Err(DataLoadError::DatasetNotFound {
            path: data_dir.display().to_string(),
        })
    }

    /// Paths of the (movies, ratings) files for this layout.
    pub fn paths(self, data_dir: &Path) -> (PathBuf, PathBuf) {
        let ext = match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Dat => "dat",
        };
        (
            data_dir.join(format!("movies.{ext}")),
            data_dir.join(format!("ratings.{ext}")),
        )
    }

    fn split(self, line: &str) -> Vec<String> {
        match self {
            DatasetFormat::Csv => split_csv_line(line),
            DatasetFormat::Dat => line.split("::").map(str::to_string).collect(),
        }
    }

    fn has_header(self) -> bool {
        self == DatasetFormat::Csv
    }
}

/// Helper function to read a file with ISO-8859-1 encoding (Latin-1)
///
/// The MovieLens 1M dataset uses ISO-8859-1, where each byte maps directly
/// to a Unicode code point.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn read_lines(path: &Path, format: DatasetFormat) -> Result<Vec<String>> {
    match format {
        DatasetFormat::Dat => read_lines_latin1(path),
        DatasetFormat::Csv => {
            let content = std::fs::read_to_string(path)?;
            Ok(content.lines().map(|s| s.to_string()).collect())
        }
    }
}

/// Split one CSV record, honouring double quotes and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Iterate over the data lines of a file as (line number, fields).
fn records(path: &Path, format: DatasetFormat) -> Result<Vec<(usize, Vec<String>)>> {
    let lines = read_lines(path, format)?;
    let skip = usize::from(format.has_header());

    Ok(lines
        .iter()
        .enumerate()
        .skip(skip)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, format.split(line.trim())))
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pulls typed fields out of one record, reporting file and line on failure.
struct FieldReader<'a> {
    file: &'a str,
    line: usize,
    fields: std::vec::IntoIter<String>,
}

impl<'a> FieldReader<'a> {
    fn new(file: &'a str, line: usize, fields: Vec<String>) -> Self {
        Self {
            file,
            line,
            fields: fields.into_iter(),
        }
    }

    fn next_raw(&mut self, name: &str) -> Result<String> {
        self.fields.next().ok_or_else(|| DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason: format!("Missing {name}"),
        })
    }

    fn next<T>(&mut self, name: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.next_raw(name)?;
        raw.trim().parse().map_err(|e| DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason: format!("Invalid {name}: {e}"),
        })
    }
}

/// Parse a movies file.
///
/// The title often includes year in parentheses: "Toy Story (1995)".
/// Genres are pipe-separated: "Adventure|Animation|Children".
pub fn parse_movies(path: &Path, format: DatasetFormat) -> Result<Vec<Movie>> {
    let file = file_name(path);
    let mut movies = Vec::new();

    for (line_no, fields) in records(path, format)? {
        let mut reader = FieldReader::new(&file, line_no, fields);
        let id: MovieId = reader.next("movieId")?;
        let title = reader.next_raw("title")?;
        let genres = reader.next_raw("genres")?;

        movies.push(Movie::new(id, title, &genres));
    }
    Ok(movies)
}

/// Parse a ratings file.
pub fn parse_ratings(path: &Path, format: DatasetFormat) -> Result<Vec<Rating>> {
    let file = file_name(path);
    let mut ratings = Vec::new();

    for (line_no, fields) in records(path, format)? {
        let mut reader = FieldReader::new(&file, line_no, fields);
        ratings.push(Rating {
            user_id: reader.next("userId")?,
            movie_id: reader.next("movieId")?,
            rating: reader.next("rating")?,
            timestamp: reader.next("timestamp")?,
        });
    }
    Ok(ratings)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub(crate) fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        if let Ok(year) = title[start + 1..end].parse::<u16>() {
            return Some(year);
        }
    }
    None
}

/// Split a delimiter-joined genre string into ordered tags.
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
pub(crate) fn parse_genres(s: &str) -> Vec<String> {
    s.split(GENRE_SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
